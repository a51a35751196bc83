//! Selection & viewport controller.
//!
//! Owns the typed postcode prefix and the fit-to-selection flag. Every input
//! event funnels through `dispatch`, which synchronously re-derives the
//! matched points, labels, bounding box and viewport transform and returns
//! the resulting `Frame`. The dataset is borrowed read-only.

use serde::Serialize;

use crate::config::{MarkerShape, RenderConfig};
use crate::dataset::PostalPoint;
use crate::projection::{Mercator, PlanePoint};
use crate::viewport::{self, BoundingBox, ViewportTransform};
use crate::POSTCODE_LEN;

/// Up to four ASCII digits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionPrefix(String);

impl SelectionPrefix {
    /// Keep the first four digits of `input`; anything else is dropped.
    pub fn clip(input: &str) -> Self {
        SelectionPrefix(
            input
                .chars()
                .filter(char::is_ascii_digit)
                .take(POSTCODE_LEN)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A full postcode has been typed.
    pub fn is_complete(&self) -> bool {
        self.0.len() == POSTCODE_LEN
    }

    pub fn matches(&self, postcode: &str) -> bool {
        postcode.starts_with(&self.0)
    }

    /// Append a digit. No-op once complete or for a non-digit.
    pub fn push(&mut self, digit: char) -> bool {
        if self.is_complete() || !digit.is_ascii_digit() {
            return false;
        }
        self.0.push(digit);
        true
    }

    /// Remove the last digit. No-op when empty.
    pub fn pop(&mut self) -> bool {
        self.0.pop().is_some()
    }
}

/// User input, independent of where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Digit(char),
    Backspace,
    Clear,
    /// Whole text-field contents
    SetText(String),
    ToggleFit,
    SetFit(bool),
}

impl InputEvent {
    /// Browser key codes: space clears, backspace/left-arrow removes,
    /// top-row and keypad digits append.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            32 => Some(InputEvent::Clear),
            8 | 37 => Some(InputEvent::Backspace),
            48..=57 => char::from_digit(code - 48, 10).map(InputEvent::Digit),
            96..=105 => char::from_digit(code - 96, 10).map(InputEvent::Digit),
            _ => None,
        }
    }
}

/// Which side of the state machine a frame is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    Fitted,
    Default,
}

/// Marker sizes for the current transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub size: f64,
    pub selected_size: f64,
    pub stroke_width: f64,
}

/// Everything a surface needs to draw the current selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub prefix: SelectionPrefix,
    pub label: String,
    pub localities: String,
    /// Indices into the dataset of highlighted points
    pub selected: Vec<usize>,
    pub state: ViewState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    pub transform: ViewportTransform,
    pub transition_ms: u32,
    pub markers: MarkerStyle,
}

pub struct Controller<'a> {
    points: &'a [PostalPoint],
    /// Projected centroid per point, None when the point has no geometry
    projected: Vec<Option<PlanePoint>>,
    config: RenderConfig,
    prefix: SelectionPrefix,
    fit_enabled: bool,
}

impl<'a> Controller<'a> {
    pub fn new(points: &'a [PostalPoint], config: RenderConfig) -> Self {
        let proj = Mercator::new(config.projection_scale, config.projection_translate);
        let projected = points
            .iter()
            .map(|p| p.centroid.and_then(|(lon, lat)| proj.project(lon, lat)))
            .collect();

        Self {
            points,
            projected,
            fit_enabled: config.fit_enabled,
            config,
            prefix: SelectionPrefix::default(),
        }
    }

    pub fn prefix(&self) -> &SelectionPrefix {
        &self.prefix
    }

    pub fn fit_enabled(&self) -> bool {
        self.fit_enabled
    }

    /// Single update entry point.
    pub fn dispatch(&mut self, event: InputEvent) -> Frame {
        match event {
            InputEvent::Digit(d) => {
                self.prefix.push(d);
            }
            InputEvent::Backspace => {
                self.prefix.pop();
            }
            InputEvent::Clear => self.prefix = SelectionPrefix::default(),
            InputEvent::SetText(text) => self.prefix = SelectionPrefix::clip(&text),
            InputEvent::ToggleFit => self.fit_enabled = !self.fit_enabled,
            InputEvent::SetFit(on) => self.fit_enabled = on,
        }
        self.frame()
    }

    /// Replace the prefix (clipped) and recompute.
    pub fn set_selection(&mut self, input: &str) -> Frame {
        self.dispatch(InputEvent::SetText(input.to_string()))
    }

    /// Indices of points with geometry whose postcode starts with the prefix.
    /// An empty prefix matches every placed point.
    pub fn matching(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(i, p)| self.projected[*i].is_some() && self.prefix.matches(&p.postcode))
            .map(|(i, _)| i)
            .collect()
    }

    /// Derive the frame for the current prefix and fit flag.
    pub fn frame(&self) -> Frame {
        let selected = if self.prefix.is_empty() {
            Vec::new()
        } else {
            self.matching()
        };

        let label = if self.prefix.is_empty() {
            self.config.instructions.clone()
        } else {
            self.prefix.as_str().to_string()
        };

        let localities = if !self.prefix.is_complete() {
            String::new()
        } else if selected.is_empty() {
            self.config.no_results_message.clone()
        } else {
            selected
                .iter()
                .flat_map(|&i| self.points[i].localities.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let fitted = if self.fit_enabled && !selected.is_empty() {
            let bounds = BoundingBox::from_points(
                selected.iter().filter_map(|&i| self.projected[i].as_ref()),
            );
            viewport::fit(
                &bounds,
                self.config.viewport_width,
                self.config.viewport_height,
                self.config.max_zoom,
            )
            .map(|t| (bounds, t))
        } else {
            None
        };

        match fitted {
            Some((bounds, transform)) => Frame {
                prefix: self.prefix.clone(),
                label,
                localities,
                selected,
                state: ViewState::Fitted,
                bounds: Some(bounds),
                transform,
                transition_ms: self.config.zoom_in_ms,
                markers: MarkerStyle {
                    shape: self.config.marker_shape,
                    size: self.config.marker_size_zoomed / transform.scale,
                    selected_size: self.config.marker_size_selected / transform.scale,
                    stroke_width: self.config.stroke_width / transform.scale,
                },
            },
            None => Frame {
                prefix: self.prefix.clone(),
                label,
                localities,
                selected,
                state: ViewState::Default,
                bounds: None,
                transform: ViewportTransform::IDENTITY,
                transition_ms: self.config.zoom_out_ms,
                markers: MarkerStyle {
                    shape: self.config.marker_shape,
                    size: self.config.marker_size,
                    selected_size: self.config.marker_size,
                    stroke_width: self.config.stroke_width,
                },
            },
        }
    }
}
