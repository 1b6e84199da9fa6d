//! Error types for the sigscan core library.

use std::path::PathBuf;

/// Top-level error enum for the sigscan core library.
#[derive(Debug, thiserror::Error)]
pub enum SigscanError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No snapshot available; run a full scan first")]
    NotScanned,

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SigscanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SigscanError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type SigscanResult<T> = Result<T, SigscanError>;
