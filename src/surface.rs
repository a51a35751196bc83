//! Output surfaces for controller frames.
//!
//! Backends:
//!   text  Human-readable status lines
//!   json  One JSON object per frame (JSON Lines)

use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::controller::{Frame, ViewState};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

struct TextBackend {
    out: Box<dyn Write>,
}

impl TextBackend {
    fn apply(&mut self, frame: &Frame) -> std::io::Result<()> {
        let label = if frame.label.is_empty() { "-" } else { frame.label.as_str() };
        writeln!(self.out, "Selection: {}", label)?;
        if !frame.localities.is_empty() {
            writeln!(self.out, "Localities: {}", frame.localities)?;
        }
        writeln!(self.out, "Matches: {}", frame.selected.len())?;
        match frame.state {
            ViewState::Fitted => writeln!(
                self.out,
                "View: fitted scale={:.3} translate=({:.1}, {:.1}) over {}ms",
                frame.transform.scale,
                frame.transform.translate.0,
                frame.transform.translate.1,
                frame.transition_ms
            )?,
            ViewState::Default => {
                writeln!(self.out, "View: default over {}ms", frame.transition_ms)?
            }
        }
        self.out.flush()
    }

    fn reset(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "View: reset")?;
        self.out.flush()
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum JsonEvent<'a> {
    Frame(&'a Frame),
    Reset,
}

struct JsonBackend {
    out: Box<dyn Write>,
}

impl JsonBackend {
    fn emit(&mut self, event: &JsonEvent) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

enum Backend {
    Text(TextBackend),
    Json(JsonBackend),
}

/// Unified output surface
pub struct Surface {
    backend: Backend,
}

impl Surface {
    pub fn new(format: Format, out: Box<dyn Write>) -> Self {
        let backend = match format {
            Format::Text => Backend::Text(TextBackend { out }),
            Format::Json => Backend::Json(JsonBackend { out }),
        };
        Self { backend }
    }

    pub fn stdout(format: Format) -> Self {
        Self::new(format, Box::new(std::io::stdout()))
    }

    pub fn backend_name(&self) -> &str {
        match &self.backend {
            Backend::Text(_) => "text",
            Backend::Json(_) => "json",
        }
    }

    pub fn apply(&mut self, frame: &Frame) -> Result<()> {
        match &mut self.backend {
            Backend::Text(b) => Ok(b.apply(frame)?),
            Backend::Json(b) => b.emit(&JsonEvent::Frame(frame)),
        }
    }

    /// Report that the view returned to its initial state.
    pub fn reset(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Text(b) => Ok(b.reset()?),
            Backend::Json(b) => b.emit(&JsonEvent::Reset),
        }
    }
}
