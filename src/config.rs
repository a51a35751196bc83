//! Render configuration, variant presets, and path resolution.
//!
//! INI parser for the [display] section, overlaid on a variant preset.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::warn;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::{
    MARKER_SIZE, MARKER_SIZE_SELECTED, MARKER_SIZE_ZOOMED, STROKE_WIDTH, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH, ZOOM_IN_MS, ZOOM_OUT_MS,
};

/// Resolved filesystem paths
#[derive(Clone, Debug)]
pub struct Paths {
    pub config_file: PathBuf,
}

impl Paths {
    pub fn init() -> std::result::Result<Self, io::Error> {
        let home = std::env::var("HOME")
            .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))?;

        let config_dir = PathBuf::from(&home).join(".config").join("postdecode");

        Ok(Self {
            config_file: config_dir.join("config.ini"),
        })
    }
}

/// Marker drawn for each postcode point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Circle,
    Rect,
}

impl FromStr for MarkerShape {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "circle" => Ok(MarkerShape::Circle),
            "rect" => Ok(MarkerShape::Rect),
            _ => Err(()),
        }
    }
}

/// On-disk layout of the point dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataFormat {
    /// One CSV row per locality with `long`/`lat` columns
    Legacy,
    /// Preprocessed JSON array, one record per postcode
    Normalized,
}

impl FromStr for DataFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "legacy" => Ok(DataFormat::Legacy),
            "normalized" => Ok(DataFormat::Normalized),
            _ => Err(()),
        }
    }
}

/// Renderer variant preset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Legacy,
    Normalized,
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "legacy" => Ok(Variant::Legacy),
            "normalized" => Ok(Variant::Normalized),
            _ => Err(()),
        }
    }
}

/// Everything the controller and its surfaces need to know about the display.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub marker_shape: MarkerShape,
    pub projection_scale: f64,
    pub projection_translate: (f64, f64),
    pub max_zoom: f64,
    pub data_format: DataFormat,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub instructions: String,
    pub no_results_message: String,
    pub fit_enabled: bool,
    pub zoom_in_ms: u32,
    pub zoom_out_ms: u32,
    pub marker_size: f64,
    pub marker_size_zoomed: f64,
    pub marker_size_selected: f64,
    pub stroke_width: f64,
}

impl RenderConfig {
    /// Rectangular dots over the per-locality CSV.
    pub fn legacy() -> Self {
        Self {
            marker_shape: MarkerShape::Rect,
            projection_scale: 800.0,
            projection_translate: (-1300.0, 0.0),
            max_zoom: 400.0,
            data_format: DataFormat::Legacy,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            instructions: String::new(),
            no_results_message: String::new(),
            fit_enabled: true,
            zoom_in_ms: ZOOM_IN_MS,
            zoom_out_ms: ZOOM_OUT_MS,
            marker_size: MARKER_SIZE,
            marker_size_zoomed: MARKER_SIZE_ZOOMED,
            marker_size_selected: MARKER_SIZE_SELECTED,
            stroke_width: STROKE_WIDTH,
        }
    }

    /// Circles over the preprocessed per-postcode JSON.
    pub fn normalized() -> Self {
        Self {
            marker_shape: MarkerShape::Circle,
            projection_scale: 900.0,
            projection_translate: (-1500.0, 0.0),
            max_zoom: 300.0,
            data_format: DataFormat::Normalized,
            instructions: "Type a postcode".to_string(),
            no_results_message: "No localities for postcode".to_string(),
            ..Self::legacy()
        }
    }

    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Legacy => Self::legacy(),
            Variant::Normalized => Self::normalized(),
        }
    }

    /// Apply one `key = value` pair from the [display] section.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::Config {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "marker_shape" => self.marker_shape = value.parse().map_err(|_| invalid())?,
            "data_format" => self.data_format = value.parse().map_err(|_| invalid())?,
            "projection_scale" => {
                self.projection_scale = parse_positive(value).ok_or_else(invalid)?
            }
            "projection_translate" => {
                let (x, y) = value.split_once(',').ok_or_else(invalid)?;
                let x = x.trim().parse().map_err(|_| invalid())?;
                let y = y.trim().parse().map_err(|_| invalid())?;
                self.projection_translate = (x, y);
            }
            "max_zoom" => self.max_zoom = parse_positive(value).ok_or_else(invalid)?,
            "viewport_width" => self.viewport_width = parse_positive(value).ok_or_else(invalid)?,
            "viewport_height" => self.viewport_height = parse_positive(value).ok_or_else(invalid)?,
            "instructions" => self.instructions = unquote(value).to_string(),
            "no_results_message" => self.no_results_message = unquote(value).to_string(),
            "fit_enabled" => self.fit_enabled = parse_bool(value).ok_or_else(invalid)?,
            "zoom_in_ms" => self.zoom_in_ms = value.parse().map_err(|_| invalid())?,
            "zoom_out_ms" => self.zoom_out_ms = value.parse().map_err(|_| invalid())?,
            "marker_size" => self.marker_size = parse_positive(value).ok_or_else(invalid)?,
            "marker_size_zoomed" => {
                self.marker_size_zoomed = parse_positive(value).ok_or_else(invalid)?
            }
            "marker_size_selected" => {
                self.marker_size_selected = parse_positive(value).ok_or_else(invalid)?
            }
            "stroke_width" => self.stroke_width = parse_positive(value).ok_or_else(invalid)?,
            _ => warn!("[config] ignoring unknown key '{}'", key),
        }
        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::normalized()
    }
}

fn parse_positive(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse INI text into a config. `variant` in [display] selects the preset;
/// the remaining keys override it.
pub fn parse_config(content: &str, default_variant: Variant) -> Result<RenderConfig> {
    let mut pairs = Vec::new();
    let mut variant = default_variant;
    let mut in_display = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') {
            in_display = trimmed == "[display]";
            continue;
        }

        if !in_display {
            continue;
        }

        if let Some((key, value)) = trimmed.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            if key == "variant" {
                variant = value.parse().map_err(|_| Error::Config {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
            } else {
                pairs.push((key, value));
            }
        }
    }

    let mut config = RenderConfig::preset(variant);
    for (key, value) in pairs {
        config.set(key, value)?;
    }
    Ok(config)
}

/// Load config from an INI file. A missing file yields the preset.
pub fn load_config(path: &Path, default_variant: Variant) -> Result<RenderConfig> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content, default_variant),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(RenderConfig::preset(default_variant)),
        Err(e) => Err(Error::io(path, e)),
    }
}
