use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A field some section needs is absent from both the per-call options
    /// and the template defaults.
    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),

    /// Table-backed sections need a header row and at least one data row.
    #[error("table `{table}` needs at least 2 rows (header and one data row), got {rows}")]
    InvalidTableShape { table: &'static str, rows: usize },

    #[error("failed to load image {location}: {reason}")]
    ImageLoad { location: String, reason: String },

    #[error("config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("failed to parse {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
