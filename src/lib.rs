//! postdecode - Australian postcode map controller and data preprocessor
//!
//! Two halves:
//!   controller  Selection prefix -> matched points -> bounding box -> viewport fit
//!   prepare     Postcode CSV + postal-area shapes -> point dataset + scribble lines

pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod postcode_index;
pub mod prepare;
pub mod projection;
pub mod session;
pub mod surface;
pub mod viewport;

pub use error::{Error, Result};

/// Digits in an Australian postcode
pub const POSTCODE_LEN: usize = 4;

/// Viewport size (pixels)
pub const VIEWPORT_WIDTH: f64 = 1200.0;
pub const VIEWPORT_HEIGHT: f64 = 800.0;

/// Fraction of the viewport a fitted selection fills
pub const FIT_FRACTION: f64 = 0.9;

/// Added to box extents so a single-point box never divides by zero
pub const BOX_EPSILON: f64 = 1e-10;

/// Transition durations (milliseconds)
pub const ZOOM_IN_MS: u32 = 750;
pub const ZOOM_OUT_MS: u32 = 200;

/// Marker rendering at identity scale
pub const MARKER_SIZE: f64 = 1.5;
pub const MARKER_SIZE_ZOOMED: f64 = 2.0;
pub const MARKER_SIZE_SELECTED: f64 = 3.0;
pub const STROKE_WIDTH: f64 = 0.5;

/// Non-deliverable (mail centre) marker in locality/district names
pub const MAIL_CENTRE_MARKER: &str = " MC";

/// Shape property holding the postal area code
pub const DEFAULT_SHAPE_KEY: &str = "POA_CODE16";

/// State order used when grouping scribble lines
pub const STATES: [&str; 8] = ["ACT", "NT", "SA", "WA", "NSW", "VIC", "QLD", "TAS"];
