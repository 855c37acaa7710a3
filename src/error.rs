// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("image {image} has no band named {band}")]
    MissingBand { image: String, band: String },

    #[error("raster size mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("collection is empty")]
    EmptyCollection,

    #[error("no features with {field} in {ids:?}")]
    NoMatchingFeatures { field: String, ids: Vec<String> },

    #[error("could not determine acquisition date from {0}")]
    UnknownDate(String),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
