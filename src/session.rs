//! Interactive session loop.
//!
//! Reads stdin one line at a time and turns it into input events:
//!   digits      append          <      remove last digit
//!   space       clear           clear  clear
//!   fit         toggle fit      =NNNN  set the text field
//!   quit        exit
//! Each event is dispatched to the controller and the resulting frame is
//! applied to the surface.

use std::io::BufRead;

use log::debug;

use crate::controller::{Controller, InputEvent};
use crate::error::{Error, Result};
use crate::surface::Surface;

/// What one input line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Events(Vec<InputEvent>),
    Quit,
}

pub fn parse_line(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.trim() {
        "quit" | "exit" | "q" => return Command::Quit,
        "clear" => return Command::Events(vec![InputEvent::Clear]),
        "fit" => return Command::Events(vec![InputEvent::ToggleFit]),
        _ => {}
    }

    if let Some(text) = line.trim().strip_prefix('=') {
        return Command::Events(vec![InputEvent::SetText(text.to_string())]);
    }

    Command::Events(
        line.chars()
            .filter_map(|c| match c {
                '0'..='9' => Some(InputEvent::Digit(c)),
                '<' => Some(InputEvent::Backspace),
                ' ' => Some(InputEvent::Clear),
                _ => None,
            })
            .collect(),
    )
}

/// Run until EOF or `quit`. Returns the number of frames applied.
pub fn run<R: BufRead>(
    controller: &mut Controller,
    surface: &mut Surface,
    input: R,
) -> Result<usize> {
    let mut frames = 0;
    surface.apply(&controller.frame())?;
    frames += 1;

    for line in input.lines() {
        let line = line.map_err(Error::Input)?;
        let events = match parse_line(&line) {
            Command::Quit => break,
            Command::Events(events) => events,
        };

        for event in events {
            debug!("[session] {:?}", event);
            let frame = controller.dispatch(event);
            surface.apply(&frame)?;
            frames += 1;
        }
    }

    controller.dispatch(InputEvent::Clear);
    surface.reset()?;
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::dataset::PostalPoint;
    use crate::surface::Format;

    #[test]
    fn keystroke_lines_become_events() {
        assert_eq!(
            parse_line("30<1"),
            Command::Events(vec![
                InputEvent::Digit('3'),
                InputEvent::Digit('0'),
                InputEvent::Backspace,
                InputEvent::Digit('1'),
            ])
        );
        assert_eq!(parse_line(" "), Command::Events(vec![InputEvent::Clear]));
        assert_eq!(parse_line("fit\n"), Command::Events(vec![InputEvent::ToggleFit]));
        assert_eq!(
            parse_line("=2600"),
            Command::Events(vec![InputEvent::SetText("2600".to_string())])
        );
        assert_eq!(parse_line("quit"), Command::Quit);
        assert_eq!(parse_line("abc"), Command::Events(Vec::new()));
    }

    #[test]
    fn session_applies_a_frame_per_event() {
        let points = vec![PostalPoint {
            postcode: "2600".to_string(),
            centroid: Some((149.13, -35.3)),
            localities: vec!["CANBERRA".to_string()],
            states: vec!["ACT".to_string()],
        }];
        let mut controller = Controller::new(&points, RenderConfig::legacy());
        let mut surface = Surface::new(Format::Text, Box::new(std::io::sink()));

        let input = "26\nfit\n=2600\nquit\n99\n";
        let frames = run(&mut controller, &mut surface, input.as_bytes()).unwrap();
        // initial + 2 digits + toggle + set text
        assert_eq!(frames, 5);
        assert!(controller.prefix().is_empty());
        assert!(!controller.fit_enabled());
    }

    #[test]
    fn unreadable_input_is_an_input_error() {
        let points: Vec<PostalPoint> = Vec::new();
        let mut controller = Controller::new(&points, RenderConfig::legacy());
        let mut surface = Surface::new(Format::Text, Box::new(std::io::sink()));

        // invalid UTF-8 fails inside lines()
        let input: &[u8] = b"30\n\xff\xfe\n";
        let err = run(&mut controller, &mut surface, input).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
