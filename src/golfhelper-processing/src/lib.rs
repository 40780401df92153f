//! golfhelper-processing - Video conversion for Golfhelper
//!
//! Wraps the external transcoder behind a small trait so the organizer
//! never shells out directly.

pub mod error;
pub mod transcoder;

pub use error::TranscodeError;
pub use transcoder::{FfmpegTranscoder, Transcoder};
