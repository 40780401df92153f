//! Source video discovery

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};

/// Container formats accepted as input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// QuickTime, the iPhone camera default. Needs a container change.
    Mov,
    /// Already in the target container
    Mp4,
}

impl VideoFormat {
    /// Detect the format from a path's extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("mov") {
            Some(VideoFormat::Mov)
        } else if ext.eq_ignore_ascii_case("mp4") {
            Some(VideoFormat::Mp4)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mov => "mov",
            VideoFormat::Mp4 => "mp4",
        }
    }
}

/// A video file waiting to be organized
#[derive(Debug, Clone, Serialize)]
pub struct SourceVideo {
    pub path: PathBuf,
    pub format: VideoFormat,
    pub captured_at: DateTime<Local>,
    pub size_bytes: u64,
}

impl SourceVideo {
    /// Inspect a single file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = VideoFormat::from_path(path)
            .ok_or_else(|| LibraryError::UnsupportedFormat(path.to_path_buf()))?;

        let metadata = fs::metadata(path).map_err(|e| LibraryError::io(path, e))?;

        // Creation time is not available on every filesystem
        let captured = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| LibraryError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
            captured_at: DateTime::<Local>::from(captured),
            size_bytes: metadata.len(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Collect the videos to organize from a file or a folder
///
/// A folder is scanned one level deep. Entries with other extensions are
/// skipped, as are videos that cannot be inspected; the result is ordered
/// by capture time, then path.
pub fn scan_sources(path: impl AsRef<Path>) -> Result<Vec<SourceVideo>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LibraryError::SourceNotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        return Ok(vec![SourceVideo::from_path(path)?]);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| LibraryError::io(path, e))? {
        match entry {
            Ok(entry) => candidates.push(entry.path()),
            Err(e) => warn!("skipping unreadable entry in {:?}: {}", path, e),
        }
    }

    let videos = inspect_candidates(candidates);
    debug!("found {} video(s) in {:?}", videos.len(), path);
    Ok(videos)
}

/// Inspect folder entries, reporting and skipping the ones that fail
fn inspect_candidates(candidates: Vec<PathBuf>) -> Vec<SourceVideo> {
    let mut videos = Vec::new();

    for candidate in candidates {
        if candidate.is_dir() {
            continue;
        }

        if VideoFormat::from_path(&candidate).is_none() {
            debug!("skipping non-video file {:?}", candidate);
            continue;
        }

        match SourceVideo::from_path(&candidate) {
            Ok(video) => videos.push(video),
            Err(e) => warn!("skipping {:?}: {}", candidate, e),
        }
    }

    videos.sort_by(|a, b| {
        a.captured_at
            .cmp(&b.captured_at)
            .then_with(|| a.path.cmp(&b.path))
    });
    videos
}
