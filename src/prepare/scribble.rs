//! Scribble lines: within each state, join every postcode's centroid to the
//! next one in numeric order.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use log::debug;

use super::group::StateGroup;

fn locality_names(p: &super::group::PostcodeGroup) -> String {
    p.localities
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One LineString feature per consecutive postcode pair. `segmentIndex` is the
/// position of the "from" postcode; pairs missing a centroid are skipped.
pub fn line_features(states: &[StateGroup]) -> FeatureCollection {
    let mut features = Vec::new();

    for group in states {
        let mut sorted: Vec<_> = group.postcodes.iter().collect();
        sorted.sort_by_key(|p| p.sort_key());

        for (index, pair) in sorted.windows(2).enumerate() {
            let (from, to) = (pair[0], pair[1]);
            let (Some(a), Some(b)) = (from.centroid, to.centroid) else {
                debug!(
                    "[scribble] {}: {} -> {} skipped (no centroid)",
                    group.state, from.postcode, to.postcode
                );
                continue;
            };

            let mut properties = JsonObject::new();
            properties.insert("state".to_string(), group.state.into());
            properties.insert("fromPostcode".to_string(), from.postcode.clone().into());
            properties.insert("toPostcode".to_string(), to.postcode.clone().into());
            properties.insert("fromLocalities".to_string(), locality_names(from).into());
            properties.insert("toLocalities".to_string(), locality_names(to).into());
            properties.insert("segmentIndex".to_string(), index.into());

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(vec![
                    vec![a.0, a.1],
                    vec![b.0, b.1],
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::group::{Locality, PostcodeGroup};

    fn pc(postcode: &str, centroid: Option<(f64, f64)>, names: &[&str]) -> PostcodeGroup {
        PostcodeGroup {
            postcode: postcode.to_string(),
            dc: String::new(),
            localities: names
                .iter()
                .map(|n| Locality {
                    name: n.to_string(),
                    state: "NT".to_string(),
                })
                .collect(),
            states: vec!["NT".to_string()],
            centroid,
        }
    }

    fn prop<'a>(f: &'a Feature, key: &str) -> &'a serde_json::Value {
        f.property(key).unwrap()
    }

    #[test]
    fn segments_follow_numeric_order() {
        let states = vec![StateGroup {
            state: "NT",
            postcodes: vec![
                pc("0850", Some((133.0, -14.5)), &["KATHERINE"]),
                pc("0800", Some((130.8, -12.5)), &["DARWIN CITY"]),
                pc("0810", Some((130.9, -12.4)), &["CASUARINA", "NAKARA"]),
            ],
        }];
        let fc = line_features(&states);
        assert_eq!(fc.features.len(), 2);

        let first = &fc.features[0];
        assert_eq!(prop(first, "fromPostcode"), "0800");
        assert_eq!(prop(first, "toPostcode"), "0810");
        assert_eq!(prop(first, "toLocalities"), "CASUARINA, NAKARA");
        assert_eq!(prop(first, "state"), "NT");
        assert_eq!(prop(first, "segmentIndex"), 0);

        let second = &fc.features[1];
        assert_eq!(prop(second, "fromPostcode"), "0810");
        assert_eq!(prop(second, "segmentIndex"), 1);
        match &second.geometry.as_ref().unwrap().value {
            Value::LineString(coords) => {
                assert_eq!(coords, &vec![vec![130.9, -12.4], vec![133.0, -14.5]])
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn missing_centroid_skips_segment_but_keeps_index() {
        let states = vec![StateGroup {
            state: "NT",
            postcodes: vec![
                pc("0800", Some((130.8, -12.5)), &["DARWIN CITY"]),
                pc("0810", None, &["CASUARINA"]),
                pc("0820", Some((130.85, -12.43)), &["BAYVIEW"]),
                pc("0822", Some((131.0, -12.6)), &["COX PENINSULA"]),
            ],
        }];
        let fc = line_features(&states);
        assert_eq!(fc.features.len(), 1);
        assert_eq!(prop(&fc.features[0], "fromPostcode"), "0820");
        assert_eq!(prop(&fc.features[0], "segmentIndex"), 2);
    }

    #[test]
    fn single_postcode_state_has_no_segments() {
        let states = vec![
            StateGroup {
                state: "NT",
                postcodes: vec![pc("0800", Some((130.8, -12.5)), &["DARWIN CITY"])],
            },
            StateGroup {
                state: "TAS",
                postcodes: Vec::new(),
            },
        ];
        assert!(line_features(&states).features.is_empty());
    }
}
