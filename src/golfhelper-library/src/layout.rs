//! Destination layout under the library root
//!
//! ```text
//! <root>/
//!   24-05-17/
//!     videos/   7_0.mp4, 7_1.mp4, D_0.mp4 ...
//!     analyze/
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::club::Club;
use crate::error::{LibraryError, Result};

/// Date format of session folder names
pub const SESSION_DATE_FORMAT: &str = "%y-%m-%d";
pub const VIDEOS_DIR: &str = "videos";
pub const ANALYZE_DIR: &str = "analyze";

const OUTPUT_EXTENSION: &str = "mp4";
const STAGING_SUFFIX: &str = "_unc";

/// One practice session: a dated folder under the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    root: PathBuf,
    date: NaiveDate,
}

impl Session {
    pub fn new(root: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            root: root.into(),
            date,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn name(&self) -> String {
        self.date.format(SESSION_DATE_FORMAT).to_string()
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(self.name())
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.dir().join(VIDEOS_DIR)
    }

    pub fn analyze_dir(&self) -> PathBuf {
        self.dir().join(ANALYZE_DIR)
    }

    /// Create the session folders. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.videos_dir(), self.analyze_dir()] {
            fs::create_dir_all(&dir).map_err(|e| LibraryError::io(&dir, e))?;
        }
        debug!("session folder ready: {:?}", self.dir());
        Ok(())
    }

    /// Reserve the next free `<CLUB>_<n>.mp4` name in the videos folder
    pub fn next_slot(&self, club: Club) -> OutputSlot {
        next_slot(&self.videos_dir(), club)
    }
}

/// Paths for one converted clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSlot {
    pub index: u32,
    /// Where the finished clip lands
    pub final_path: PathBuf,
    /// Intermediate, pre-compression conversion
    pub staging_path: PathBuf,
}

/// Pick the lowest index whose final file does not exist yet
pub fn next_slot(videos_dir: &Path, club: Club) -> OutputSlot {
    let mut index = 0;
    loop {
        let slot = slot_at(videos_dir, club, index);
        if !slot.final_path.exists() {
            return slot;
        }
        index += 1;
    }
}

fn slot_at(videos_dir: &Path, club: Club, index: u32) -> OutputSlot {
    let base = format!("{}_{}", club.code(), index);
    OutputSlot {
        index,
        final_path: videos_dir.join(format!("{}.{}", base, OUTPUT_EXTENSION)),
        staging_path: videos_dir.join(format!("{}{}.{}", base, STAGING_SUFFIX, OUTPUT_EXTENSION)),
    }
}

/// Clip counts for one session folder
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub name: String,
    pub date: NaiveDate,
    pub path: PathBuf,
    pub clips: BTreeMap<String, usize>,
}

impl SessionSummary {
    pub fn total_clips(&self) -> usize {
        self.clips.values().sum()
    }
}

/// List dated session folders under `root`, oldest first
pub fn list_sessions(root: impl AsRef<Path>) -> Result<Vec<SessionSummary>> {
    let root = root.as_ref();
    let mut sessions = Vec::new();

    for entry in fs::read_dir(root).map_err(|e| LibraryError::io(root, e))? {
        let entry = entry.map_err(|e| LibraryError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let Ok(date) = NaiveDate::parse_from_str(&name, SESSION_DATE_FORMAT) else {
            debug!("ignoring non-session folder {:?}", path);
            continue;
        };

        let clips = count_clips(&path.join(VIDEOS_DIR))?;
        sessions.push(SessionSummary {
            name,
            date,
            path,
            clips,
        });
    }

    sessions.sort_by_key(|s| s.date);
    Ok(sessions)
}

fn count_clips(videos_dir: &Path) -> Result<BTreeMap<String, usize>> {
    let mut clips = BTreeMap::new();
    if !videos_dir.is_dir() {
        return Ok(clips);
    }

    for entry in fs::read_dir(videos_dir).map_err(|e| LibraryError::io(videos_dir, e))? {
        let entry = entry.map_err(|e| LibraryError::io(videos_dir, e))?;
        if let Some(club) = clip_club(&entry.path()) {
            *clips.entry(club.code().to_string()).or_insert(0) += 1;
        }
    }

    Ok(clips)
}

/// Club of a finished clip name such as `7W_3.mp4`; staging files don't count
fn clip_club(path: &Path) -> Option<Club> {
    if path.extension()?.to_str()? != OUTPUT_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (code, index) = stem.rsplit_once('_')?;
    index.parse::<u32>().ok()?;
    code.parse().ok()
}
