//! Point dataset loading.
//!
//! Normalized: JSON array of {postcode, centroid, localities, states}.
//! Legacy: CSV with one row per locality and `long`/`lat` columns.
//! A (0, 0) centroid, or a missing one, means "no geometry".

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::DataFormat;
use crate::error::{Error, Result};
use crate::prepare::POINTS_FILE;

/// Per-locality CSV read by the legacy variant
pub const LEGACY_FILE: &str = "postcodes.csv";

const LEGACY_HEADERS: [&str; 3] = ["postcode", "long", "lat"];

/// Dataset file looked for in the working directory when none is given.
pub fn default_path(format: DataFormat) -> &'static str {
    match format {
        DataFormat::Normalized => POINTS_FILE,
        DataFormat::Legacy => LEGACY_FILE,
    }
}

/// (longitude, latitude) in degrees
pub type LonLat = (f64, f64);

/// One postcode on the map.
#[derive(Clone, Debug, PartialEq)]
pub struct PostalPoint {
    pub postcode: String,
    pub centroid: Option<LonLat>,
    pub localities: Vec<String>,
    pub states: Vec<String>,
}

/// On-disk record of the normalized dataset. Also written by `prepare`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PointRecord {
    #[serde(default)]
    pub states: Vec<String>,
    pub postcode: String,
    #[serde(default)]
    pub localities: Vec<String>,
    #[serde(default)]
    pub centroid: Option<[f64; 2]>,
}

/// Treat the (0, 0) sentinel as absent.
pub fn centroid_from_pair(pair: [f64; 2]) -> Option<LonLat> {
    if pair[0] == 0.0 && pair[1] == 0.0 {
        None
    } else {
        Some((pair[0], pair[1]))
    }
}

impl From<PointRecord> for PostalPoint {
    fn from(r: PointRecord) -> Self {
        PostalPoint {
            postcode: r.postcode,
            centroid: r.centroid.and_then(centroid_from_pair),
            localities: r.localities,
            states: r.states,
        }
    }
}

#[derive(Deserialize)]
struct LegacyRow {
    postcode: String,
    #[serde(default)]
    locality: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    long: String,
    #[serde(default)]
    lat: String,
}

impl LegacyRow {
    fn into_point(self) -> PostalPoint {
        let centroid = if self.lat.trim() == "0" && self.long.trim() == "0" {
            None
        } else {
            match (self.long.trim().parse::<f64>(), self.lat.trim().parse::<f64>()) {
                (Ok(lon), Ok(lat)) => Some((lon, lat)),
                _ => {
                    debug!("[dataset] {}: unparseable coordinates", self.postcode);
                    None
                }
            }
        };

        PostalPoint {
            postcode: self.postcode,
            centroid,
            localities: vec![self.locality],
            states: if self.state.is_empty() {
                Vec::new()
            } else {
                vec![self.state]
            },
        }
    }
}

/// Parse the normalized JSON dataset.
pub fn parse_normalized(content: &str) -> Result<Vec<PostalPoint>> {
    let records: Vec<PointRecord> = serde_json::from_str(content)?;
    Ok(records.into_iter().map(PostalPoint::from).collect())
}

/// Parse the legacy per-locality CSV. The `postcode`, `long` and `lat`
/// columns are required.
pub fn parse_legacy<R: std::io::Read>(reader: R) -> Result<Vec<PostalPoint>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?;
    if let Some(missing) = LEGACY_HEADERS
        .iter()
        .find(|h| !headers.iter().any(|c| c.trim() == **h))
    {
        return Err(Error::Config {
            key: "header".to_string(),
            value: format!("legacy CSV lacks a '{}' column", missing),
        });
    }

    let mut points = Vec::new();
    for row in rdr.deserialize::<LegacyRow>() {
        points.push(row?.into_point());
    }
    Ok(points)
}

/// Load a dataset file in the given format.
pub fn load(path: &Path, format: DataFormat) -> Result<Vec<PostalPoint>> {
    let points = match format {
        DataFormat::Normalized => {
            let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            parse_normalized(&content)?
        }
        DataFormat::Legacy => {
            let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
            parse_legacy(std::io::BufReader::new(file))?
        }
    };

    let placed = points.iter().filter(|p| p.centroid.is_some()).count();
    info!(
        "[dataset] {} points loaded from {} ({} with geometry)",
        points.len(),
        path.display(),
        placed
    );
    Ok(points)
}
