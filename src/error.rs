//! Error type shared by the loader, preprocessor and index.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON")]
    Json(#[from] serde_json::Error),
    #[error("malformed GeoJSON")]
    GeoJson(#[from] geojson::Error),
    #[error("Invalid config value for '{key}': {value}")]
    Config { key: String, value: String },
    #[error("Invalid postcode index: {0}")]
    Index(String),
    #[error("reading input")]
    Input(#[source] std::io::Error),
    #[error("writing output")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
