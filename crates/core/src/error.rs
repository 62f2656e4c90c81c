//! Error types for BAWS

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for BAWS operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Grid shape mismatch in {}: expected ({er}, {ec}), got ({ar}, {ac})", path.display())]
    GridShapeMismatch {
        path: PathBuf,
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    #[error("Unsupported CRS transformation: {from} -> {to}")]
    UnsupportedCrs { from: String, to: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Malformed data in {source_name}: {reason}")]
    Format { source_name: String, reason: String },

    #[error("File name {} does not contain marker '{marker}'", path.display())]
    Naming { path: PathBuf, marker: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Layer '{layer}': {reason}")]
    Layer { layer: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Format`] error
    pub fn format(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Format {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for BAWS operations
pub type Result<T> = std::result::Result<T, Error>;
