//! Offline preprocessing pipeline.
//!
//! load shapes -> load rows -> filter/group/centroid -> group by state ->
//! scribble lines + point dataset + binary index -> write.
//!
//! Every output is serialized before the first file is written. Each file
//! goes to a temporary sibling and is renamed into place.

pub mod group;
pub mod scribble;

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};
use log::info;

use crate::dataset::{PointRecord, PostalPoint};
use crate::error::{Error, Result};
use crate::postcode_index;
use crate::DEFAULT_SHAPE_KEY;

pub use group::{PostcodeGroup, Row, ShapeIndex, StateGroup};

pub const POINTS_FILE: &str = "postdecode.json";
pub const SCRIBBLES_FILE: &str = "scribbles.geojson";
pub const INDEX_FILE: &str = "postcodes.bin";

pub struct PrepareOptions {
    pub postcodes: PathBuf,
    pub shapes: PathBuf,
    pub out_dir: PathBuf,
    pub shape_key: String,
}

impl PrepareOptions {
    pub fn new(postcodes: impl Into<PathBuf>, shapes: impl Into<PathBuf>) -> Self {
        Self {
            postcodes: postcodes.into(),
            shapes: shapes.into(),
            out_dir: PathBuf::from("."),
            shape_key: DEFAULT_SHAPE_KEY.to_string(),
        }
    }
}

/// Derived datasets, not yet written.
pub struct Outputs {
    pub points: Vec<PointRecord>,
    pub scribbles: FeatureCollection,
    pub index: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub shapes: usize,
    pub postcodes: usize,
    pub segments: usize,
}

/// Point record for the controller. Absent centroids use the (0, 0) sentinel.
fn point_record(p: &PostcodeGroup) -> PointRecord {
    PointRecord {
        states: p.states.clone(),
        postcode: p.postcode.clone(),
        localities: p.locality_labels(),
        centroid: Some(p.centroid.map_or([0.0, 0.0], |(lon, lat)| [lon, lat])),
    }
}

/// Load postal-area shapes from a GeoJSON feature collection.
pub fn load_shapes(path: &Path) -> Result<FeatureCollection> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let geojson: GeoJson = content.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

/// Load the postcode/locality table. Any malformed row aborts.
pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let file = fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let mut rdr = csv::Reader::from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    for row in rdr.deserialize::<Row>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Run the join and derive every output in memory.
pub fn build(rows: &[Row], shapes: &FeatureCollection, shape_key: &str) -> Result<Outputs> {
    let shape_index = ShapeIndex::new(&shapes.features, shape_key);
    let postcodes = group::process_postcodes(rows, &shape_index)?;
    info!(
        "[prepare] {} postcodes in file and {} shapes",
        postcodes.len(),
        shape_index.len()
    );

    info!("[prepare] Grouping into states...");
    let by_state = group::group_by_state(&postcodes);

    info!("[prepare] Generating scribble lines...");
    let scribbles = scribble::line_features(&by_state);

    info!("[prepare] Generating point data...");
    let points: Vec<PointRecord> = postcodes.iter().map(point_record).collect();

    let placed: Vec<PostalPoint> = points.iter().cloned().map(PostalPoint::from).collect();
    let index = postcode_index::encode(&placed);

    Ok(Outputs {
        points,
        scribbles,
        index,
    })
}

/// Write `bytes` next to `path` and rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}

/// Full pipeline: read inputs, derive outputs, write them to `out_dir`.
pub fn run(opts: &PrepareOptions) -> Result<Summary> {
    info!("[prepare] Loading postcode shapes...");
    let shapes = load_shapes(&opts.shapes)?;

    info!("[prepare] Loading postcode data...");
    let rows = load_rows(&opts.postcodes)?;

    let outputs = build(&rows, &shapes, &opts.shape_key)?;

    let points_json = serde_json::to_vec(&outputs.points)?;
    let scribbles_json = serde_json::to_vec(&outputs.scribbles)?;

    fs::create_dir_all(&opts.out_dir).map_err(|e| Error::io(&opts.out_dir, e))?;

    let scribbles_path = opts.out_dir.join(SCRIBBLES_FILE);
    info!("[prepare] Writing scribbles to '{}'", scribbles_path.display());
    write_atomic(&scribbles_path, &scribbles_json)?;

    let points_path = opts.out_dir.join(POINTS_FILE);
    info!("[prepare] Writing point data to '{}'", points_path.display());
    write_atomic(&points_path, &points_json)?;

    let index_path = opts.out_dir.join(INDEX_FILE);
    info!("[prepare] Writing index to '{}'", index_path.display());
    write_atomic(&index_path, &outputs.index)?;

    info!("[prepare] Done!");
    Ok(Summary {
        shapes: shapes.features.len(),
        postcodes: outputs.points.len(),
        segments: outputs.scribbles.features.len(),
    })
}
