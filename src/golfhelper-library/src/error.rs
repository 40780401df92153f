//! Library error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source not found: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("unsupported video format: {0:?} (expected .mov or .mp4)")]
    UnsupportedFormat(PathBuf),

    #[error("unknown club '{0}' (valid clubs: {1})")]
    UnknownClub(String, String),
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
