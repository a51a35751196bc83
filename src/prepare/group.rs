//! Join postcode rows against postal-area shapes and group per postcode.

use std::collections::{BTreeMap, HashMap};

use geo::Centroid;
use geojson::Feature;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::dataset::LonLat;
use crate::error::Result;
use crate::{MAIL_CENTRE_MARKER, POSTCODE_LEN, STATES};

/// One row of the postcode/locality table. Extra columns are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Row {
    pub postcode: String,
    pub locality: String,
    #[serde(default)]
    pub dc: String,
    pub state: String,
}

impl Row {
    /// Mail centres have no delivery area.
    pub fn is_mail_centre(&self) -> bool {
        self.locality.contains(MAIL_CENTRE_MARKER) || self.dc.contains(MAIL_CENTRE_MARKER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locality {
    pub name: String,
    pub state: String,
}

/// Everything known about one postcode after the join.
#[derive(Debug, Clone, PartialEq)]
pub struct PostcodeGroup {
    pub postcode: String,
    /// District of the first row
    pub dc: String,
    pub localities: Vec<Locality>,
    pub states: Vec<String>,
    pub centroid: Option<LonLat>,
}

impl PostcodeGroup {
    /// Display labels: bare names for a single-state postcode, otherwise
    /// "NAME (STATE)".
    pub fn locality_labels(&self) -> Vec<String> {
        if self.states.len() == 1 {
            self.localities.iter().map(|l| l.name.clone()).collect()
        } else {
            self.localities
                .iter()
                .map(|l| format!("{} ({})", l.name, l.state))
                .collect()
        }
    }

    /// Numeric sort key; non-numeric postcodes sort last.
    pub fn sort_key(&self) -> u32 {
        self.postcode.parse().unwrap_or(u32::MAX)
    }
}

/// Postcodes of one state with localities narrowed to that state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGroup {
    pub state: &'static str,
    pub postcodes: Vec<PostcodeGroup>,
}

/// Postal-area shapes keyed by the value of `key` in each feature's properties.
pub struct ShapeIndex<'a> {
    by_code: HashMap<String, &'a Feature>,
}

impl<'a> ShapeIndex<'a> {
    pub fn new(features: &'a [Feature], key: &str) -> Self {
        let mut by_code = HashMap::with_capacity(features.len());
        for feature in features {
            let code = match feature.property(key) {
                Some(serde_json::Value::String(s)) => s.clone(),
                // numeric codes lose their leading zero: 800 is "0800"
                Some(serde_json::Value::Number(n)) => match n.as_u64() {
                    Some(v) => format!("{:0width$}", v, width = POSTCODE_LEN),
                    None => n.to_string(),
                },
                _ => {
                    debug!("[prepare] shape without '{}' property skipped", key);
                    continue;
                }
            };
            by_code.entry(code).or_insert(feature);
        }
        Self { by_code }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn contains(&self, postcode: &str) -> bool {
        self.by_code.contains_key(postcode)
    }

    /// Area-weighted centroid of the shape for `postcode`.
    pub fn centroid(&self, postcode: &str) -> Result<Option<LonLat>> {
        let Some(feature) = self.by_code.get(postcode) else {
            return Ok(None);
        };
        let Some(geometry) = &feature.geometry else {
            warn!("[prepare] shape {} has no geometry", postcode);
            return Ok(None);
        };
        let shape = geo::Geometry::<f64>::try_from(geometry.value.clone())?;
        Ok(shape.centroid().map(|p| (p.x(), p.y())))
    }
}

/// Drop mail centres and rows without a shape, then group per postcode.
pub fn process_postcodes(rows: &[Row], shapes: &ShapeIndex) -> Result<Vec<PostcodeGroup>> {
    let mut grouped: BTreeMap<&str, Vec<&Row>> = BTreeMap::new();
    for row in rows {
        if row.is_mail_centre() || !shapes.contains(&row.postcode) {
            continue;
        }
        grouped.entry(row.postcode.as_str()).or_default().push(row);
    }

    let mut groups = Vec::with_capacity(grouped.len());
    for (postcode, rows) in grouped {
        let mut localities: Vec<Locality> = Vec::new();
        let mut states: Vec<String> = Vec::new();
        for row in &rows {
            let locality = Locality {
                name: row.locality.clone(),
                state: row.state.clone(),
            };
            if !localities.contains(&locality) {
                localities.push(locality);
            }
            if !states.contains(&row.state) {
                states.push(row.state.clone());
            }
        }

        groups.push(PostcodeGroup {
            postcode: postcode.to_string(),
            dc: rows[0].dc.clone(),
            localities,
            states,
            centroid: shapes.centroid(postcode)?,
        });
    }
    Ok(groups)
}

/// Split postcodes by state in `STATES` order.
pub fn group_by_state(postcodes: &[PostcodeGroup]) -> Vec<StateGroup> {
    STATES
        .iter()
        .map(|&state| {
            let postcodes: Vec<PostcodeGroup> = postcodes
                .iter()
                .filter(|p| p.states.iter().any(|s| s == state))
                .map(|p| PostcodeGroup {
                    localities: p
                        .localities
                        .iter()
                        .filter(|l| l.state == state)
                        .cloned()
                        .collect(),
                    ..p.clone()
                })
                .collect();
            info!("[prepare] {} has {} postcodes", state, postcodes.len());
            StateGroup { state, postcodes }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};

    fn row(postcode: &str, locality: &str, dc: &str, state: &str) -> Row {
        Row {
            postcode: postcode.to_string(),
            locality: locality.to_string(),
            dc: dc.to_string(),
            state: state.to_string(),
        }
    }

    fn square(code: &str, x: f64, y: f64) -> Feature {
        let ring = vec![
            vec![x, y],
            vec![x + 2.0, y],
            vec![x + 2.0, y + 2.0],
            vec![x, y + 2.0],
            vec![x, y],
        ];
        let mut properties = serde_json::Map::new();
        properties.insert("POA_CODE16".to_string(), serde_json::Value::String(code.to_string()));
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn mail_centre_rows_are_excluded() {
        let shapes = vec![square("2000", 151.0, -34.0), square("2001", 151.0, -34.0)];
        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        let rows = vec![
            row("2000", "SYDNEY", "SYDNEY", "NSW"),
            row("2001", "SYDNEY MC", "SYDNEY", "NSW"),
            row("2000", "HAYMARKET", "SYDNEY MC", "NSW"),
        ];
        let groups = process_postcodes(&rows, &index).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].postcode, "2000");
        assert_eq!(groups[0].localities.len(), 1);
    }

    #[test]
    fn numeric_shape_codes_keep_leading_zero() {
        let mut darwin = square("x", 130.8, -12.5);
        darwin.set_property("POA_CODE16", 800);
        let shapes = vec![darwin];

        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        assert!(index.contains("0800"));
        assert!(!index.contains("800"));

        let groups = process_postcodes(&[row("0800", "DARWIN", "", "NT")], &index).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].centroid.is_some());
    }

    #[test]
    fn rows_without_shape_are_dropped() {
        let shapes = vec![square("3000", 144.0, -38.0)];
        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        let rows = vec![
            row("3000", "MELBOURNE", "", "VIC"),
            row("3004", "ST KILDA ROAD", "", "VIC"),
        ];
        let groups = process_postcodes(&rows, &index).unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn same_postcode_rows_merge_and_dedup() {
        let shapes = vec![square("3644", 145.0, -36.0)];
        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        let rows = vec![
            row("3644", "COBRAM", "SHEPPARTON", "VIC"),
            row("3644", "BAROOGA", "COBRAM", "NSW"),
            row("3644", "COBRAM", "SHEPPARTON", "VIC"),
        ];
        let groups = process_postcodes(&rows, &index).unwrap();
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.dc, "SHEPPARTON");
        assert_eq!(g.localities.len(), 2);
        assert_eq!(g.states, vec!["VIC", "NSW"]);
        assert_eq!(g.locality_labels(), vec!["COBRAM (VIC)", "BAROOGA (NSW)"]);
    }

    #[test]
    fn centroid_is_shape_center() {
        let shapes = vec![square("0800", 130.0, -13.0)];
        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        let (lon, lat) = index.centroid("0800").unwrap().unwrap();
        assert!((lon - 131.0).abs() < 1e-9);
        assert!((lat + 12.0).abs() < 1e-9);
        assert!(index.centroid("0801").unwrap().is_none());
    }

    #[test]
    fn numeric_shape_keys_are_indexed() {
        let mut feature = square("x", 0.0, 0.0);
        feature.set_property("POA_CODE16", 4000);
        let shapes = vec![feature];
        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        assert!(index.contains("4000"));
    }

    #[test]
    fn state_groups_narrow_localities() {
        let shapes = vec![square("3644", 145.0, -36.0), square("2000", 151.0, -34.0)];
        let index = ShapeIndex::new(&shapes, "POA_CODE16");
        let rows = vec![
            row("3644", "COBRAM", "", "VIC"),
            row("3644", "BAROOGA", "", "NSW"),
            row("2000", "SYDNEY", "", "NSW"),
        ];
        let groups = process_postcodes(&rows, &index).unwrap();
        let by_state = group_by_state(&groups);
        assert_eq!(by_state.len(), STATES.len());

        let nsw = by_state.iter().find(|g| g.state == "NSW").unwrap();
        assert_eq!(nsw.postcodes.len(), 2);
        let border = nsw.postcodes.iter().find(|p| p.postcode == "3644").unwrap();
        let barooga = Locality {
            name: "BAROOGA".into(),
            state: "NSW".into(),
        };
        assert_eq!(border.localities, vec![barooga]);

        let vic = by_state.iter().find(|g| g.state == "VIC").unwrap();
        assert_eq!(vic.postcodes.len(), 1);
        assert!(by_state.iter().find(|g| g.state == "TAS").unwrap().postcodes.is_empty());
    }
}
