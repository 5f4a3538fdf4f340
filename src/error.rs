use std::ffi::c_int;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VecInitError {
    #[error("sqlite-vec initialization failed (code {code}): {message}")]
    ExtensionInit { code: c_int, message: String },

    #[error("failed to register sqlite-vec auto extension: {0}")]
    AutoExtension(#[source] rusqlite::Error),

    #[error("sqlite-vec is not loaded on this connection")]
    ExtensionMissing,

    #[error("invalid table name: {name}")]
    InvalidTableName { name: String },

    #[error("invalid vector dimension: {0}")]
    InvalidDimension(usize),

    #[error("dimension mismatch: expected {expected}, actual {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VecInitError>;
