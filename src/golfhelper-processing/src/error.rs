//! Transcoding error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("transcoder '{0}' not found - please install FFmpeg")]
    NotFound(String),

    #[error("failed to run transcoder: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("transcoding {path:?} failed ({status}): {stderr}")]
    Failed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("transcoder reported success but produced no output at {0:?}")]
    MissingOutput(PathBuf),
}
