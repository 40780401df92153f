//! Convert swing videos and file them into session folders

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use golfhelper_library::{Club, OutputSlot, Session, SourceVideo, VideoFormat};
use golfhelper_processing::Transcoder;

use crate::config::{Config, SessionDate};

/// Settings for one organize run
#[derive(Debug, Clone)]
pub struct OrganizeSettings {
    pub root: PathBuf,
    /// Clips above this size are downscaled
    pub max_video_size_bytes: u64,
    pub delete_original: bool,
    pub session_date: SessionDate,
    /// Session date used in `SessionDate::Today` mode
    pub today: NaiveDate,
}

impl OrganizeSettings {
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self {
            root: config.root.clone(),
            max_video_size_bytes: config.max_video_size_bytes(),
            delete_original: false,
            session_date: config.session_date,
            today,
        }
    }
}

/// A clip that made it into the library
#[derive(Debug, Clone)]
pub struct OrganizedVideo {
    pub source: PathBuf,
    pub output: PathBuf,
    pub compressed: bool,
    pub original_deleted: bool,
}

/// A source that was left in place because processing failed
#[derive(Debug, Clone)]
pub struct FailedVideo {
    pub source: PathBuf,
    pub error: String,
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub organized: Vec<OrganizedVideo>,
    pub failed: Vec<FailedVideo>,
    /// Stopped early on a shutdown signal
    pub interrupted: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.organized.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }
}

pub struct Organizer<T: Transcoder> {
    settings: OrganizeSettings,
    transcoder: T,
}

impl<T: Transcoder> Organizer<T> {
    pub fn new(settings: OrganizeSettings, transcoder: T) -> Self {
        Self {
            settings,
            transcoder,
        }
    }

    /// Session a source is filed under
    pub fn session_for(&self, source: &SourceVideo) -> Session {
        let date = match self.settings.session_date {
            SessionDate::Today => self.settings.today,
            SessionDate::Capture => source.captured_at.date_naive(),
        };
        Session::new(&self.settings.root, date)
    }

    /// Process sources one after another, continuing past failures
    pub fn organize_batch(
        &self,
        sources: &[SourceVideo],
        club: Club,
        running: &AtomicBool,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let total = sources.len();

        for (i, source) in sources.iter().enumerate() {
            if !running.load(Ordering::SeqCst) {
                warn!("stopping before {} remaining video(s)", total - i);
                report.interrupted = true;
                break;
            }

            info!("[{}/{}] organizing {}", i + 1, total, source.file_name());

            match self.organize_one(source, club) {
                Ok(video) => report.organized.push(video),
                Err(e) => {
                    error!("failed to organize {:?}: {:#}", source.path, e);
                    report.failed.push(FailedVideo {
                        source: source.path.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        report
    }

    /// Convert one source into the next free slot of its session
    ///
    /// On failure every file written for this source is removed and the
    /// source itself is not touched.
    pub fn organize_one(&self, source: &SourceVideo, club: Club) -> Result<OrganizedVideo> {
        let session = self.session_for(source);
        session
            .ensure()
            .with_context(|| format!("failed to prepare session folder {:?}", session.dir()))?;

        let slot = session.next_slot(club);
        debug!("output slot for {:?}: {:?}", source.path, slot.final_path);

        let compressed = match self.produce(source, &slot) {
            Ok(compressed) => compressed,
            Err(e) => {
                discard(&slot.staging_path);
                discard(&slot.final_path);
                return Err(e.context(format!("left {:?} untouched", source.path)));
            }
        };
        discard(&slot.staging_path);

        info!("created a video at {:?}", slot.final_path);

        let original_deleted = self.settings.delete_original && delete_original(&source.path);

        Ok(OrganizedVideo {
            source: source.path.clone(),
            output: slot.final_path,
            compressed,
            original_deleted,
        })
    }

    /// Write the finished clip to `slot.final_path`; returns whether it was downscaled
    fn produce(&self, source: &SourceVideo, slot: &OutputSlot) -> Result<bool> {
        match source.format {
            VideoFormat::Mov => self
                .transcoder
                .remux(&source.path, &slot.staging_path)
                .with_context(|| format!("failed to convert {:?} to mp4", source.path))?,
            VideoFormat::Mp4 => {
                fs::copy(&source.path, &slot.staging_path).with_context(|| {
                    format!("failed to copy {:?} to {:?}", source.path, slot.staging_path)
                })?;
            }
        }

        let size = fs::metadata(&slot.staging_path)
            .with_context(|| format!("failed to read size of {:?}", slot.staging_path))?
            .len();

        if size > self.settings.max_video_size_bytes {
            debug!(
                "{} bytes exceeds limit of {} bytes",
                size, self.settings.max_video_size_bytes
            );
            self.transcoder
                .downscale(&slot.staging_path, &slot.final_path)
                .with_context(|| format!("failed to compress {:?}", source.path))?;
            Ok(true)
        } else {
            fs::rename(&slot.staging_path, &slot.final_path).with_context(|| {
                format!("failed to move {:?} to {:?}", slot.staging_path, slot.final_path)
            })?;
            Ok(false)
        }
    }
}

fn discard(path: &Path) {
    if path.exists() {
        debug!("removing {:?}", path);
        if let Err(e) = fs::remove_file(path) {
            warn!("failed to remove {:?}: {}", path, e);
        }
    }
}

fn delete_original(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("deleted original {:?}", path);
            true
        }
        Err(e) => {
            warn!("clip saved but original {:?} could not be deleted: {}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use golfhelper_library::scan_sources;
    use golfhelper_processing::TranscodeError;
    use std::cell::RefCell;
    use std::sync::Arc;

    /// Copies bytes for remux and keeps half of them for downscale
    #[derive(Default)]
    struct FakeTranscoder {
        fail_remux: bool,
        fail_downscale: bool,
        /// Cleared during remux, as the Ctrl+C handler would
        running: Option<Arc<AtomicBool>>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl Transcoder for FakeTranscoder {
        fn remux(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
            self.calls.borrow_mut().push("remux");
            if let Some(running) = &self.running {
                running.store(false, Ordering::SeqCst);
            }
            if self.fail_remux {
                fs::write(output, b"partial").unwrap();
                return Err(TranscodeError::Failed {
                    path: input.to_path_buf(),
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                });
            }
            fs::copy(input, output)?;
            Ok(())
        }

        fn downscale(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
            self.calls.borrow_mut().push("downscale");
            if self.fail_downscale {
                fs::write(output, b"partial").unwrap();
                return Err(TranscodeError::MissingOutput(output.to_path_buf()));
            }
            let data = fs::read(input)?;
            fs::write(output, &data[..data.len() / 2])?;
            Ok(())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        source_dir: PathBuf,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let source_dir = dir.path().join("camera");
            let root = dir.path().join("golf");
            fs::create_dir_all(&source_dir).unwrap();
            Self {
                _dir: dir,
                source_dir,
                root,
            }
        }

        fn add_source(&self, name: &str, size: usize) -> PathBuf {
            let path = self.source_dir.join(name);
            fs::write(&path, vec![7u8; size]).unwrap();
            path
        }

        fn settings(&self) -> OrganizeSettings {
            OrganizeSettings {
                root: self.root.clone(),
                max_video_size_bytes: 100,
                delete_original: false,
                session_date: SessionDate::Today,
                today: today(),
            }
        }

        fn videos_dir(&self) -> PathBuf {
            self.root.join("24-05-17").join("videos")
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn club(code: &str) -> Club {
        code.parse().unwrap()
    }

    fn running() -> AtomicBool {
        AtomicBool::new(true)
    }

    #[test]
    fn test_mov_is_remuxed_into_session() {
        let fx = Fixture::new();
        let src = fx.add_source("IMG_0001.MOV", 40);
        let organizer = Organizer::new(fx.settings(), FakeTranscoder::default());

        let sources = scan_sources(&src).unwrap();
        let video = organizer.organize_one(&sources[0], club("7")).unwrap();

        assert_eq!(video.output, fx.videos_dir().join("7_0.mp4"));
        assert!(!video.compressed);
        assert_eq!(fs::read(&video.output).unwrap().len(), 40);
        assert!(fx.root.join("24-05-17").join("analyze").is_dir());
        assert!(!fx.videos_dir().join("7_0_unc.mp4").exists());
        assert!(src.exists());
        assert_eq!(*organizer.transcoder.calls.borrow(), vec!["remux"]);
    }

    #[test]
    fn test_large_clip_is_downscaled() {
        let fx = Fixture::new();
        let src = fx.add_source("IMG_0002.mov", 300);
        let organizer = Organizer::new(fx.settings(), FakeTranscoder::default());

        let sources = scan_sources(&src).unwrap();
        let video = organizer.organize_one(&sources[0], club("d")).unwrap();

        assert!(video.compressed);
        assert_eq!(video.output, fx.videos_dir().join("D_0.mp4"));
        assert_eq!(fs::read(&video.output).unwrap().len(), 150);
        assert!(!fx.videos_dir().join("D_0_unc.mp4").exists());
        assert_eq!(*organizer.transcoder.calls.borrow(), vec!["remux", "downscale"]);
    }

    #[test]
    fn test_mp4_is_copied_without_transcoding() {
        let fx = Fixture::new();
        let src = fx.add_source("clip.mp4", 10);
        let organizer = Organizer::new(fx.settings(), FakeTranscoder::default());

        let sources = scan_sources(&src).unwrap();
        let video = organizer.organize_one(&sources[0], club("P")).unwrap();

        assert_eq!(video.output, fx.videos_dir().join("P_0.mp4"));
        assert!(src.exists());
        assert!(organizer.transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_running_twice_versions_duplicates() {
        let fx = Fixture::new();
        fx.add_source("a.mov", 10);
        fx.add_source("b.mov", 10);
        let organizer = Organizer::new(fx.settings(), FakeTranscoder::default());
        let sources = scan_sources(&fx.source_dir).unwrap();

        let first = organizer.organize_batch(&sources, club("7W"), &running());
        let second = organizer.organize_batch(&sources, club("7W"), &running());

        assert!(first.is_success());
        assert!(second.is_success());
        for index in 0..4 {
            assert!(fx.videos_dir().join(format!("7W_{}.mp4", index)).exists());
        }
        assert!(!fx.videos_dir().join("7W_4.mp4").exists());
    }

    #[test]
    fn test_failed_remux_leaves_source_and_cleans_up() {
        let fx = Fixture::new();
        let src = fx.add_source("broken.mov", 10);
        let transcoder = FakeTranscoder {
            fail_remux: true,
            ..Default::default()
        };
        let organizer = Organizer::new(fx.settings(), transcoder);

        let sources = scan_sources(&src).unwrap();
        let err = organizer.organize_one(&sources[0], club("S")).unwrap_err();

        assert!(format!("{:#}", err).contains("broken.mov"));
        assert_eq!(fs::read(&src).unwrap(), vec![7u8; 10]);
        assert!(!fx.videos_dir().join("S_0_unc.mp4").exists());
        assert!(!fx.videos_dir().join("S_0.mp4").exists());
    }

    #[test]
    fn test_failed_downscale_removes_partial_output() {
        let fx = Fixture::new();
        let src = fx.add_source("big.mov", 500);
        let transcoder = FakeTranscoder {
            fail_downscale: true,
            ..Default::default()
        };
        let mut settings = fx.settings();
        settings.delete_original = true;
        let organizer = Organizer::new(settings, transcoder);

        let sources = scan_sources(&src).unwrap();
        assert!(organizer.organize_one(&sources[0], club("3H")).is_err());

        assert!(src.exists());
        assert!(!fx.videos_dir().join("3H_0.mp4").exists());
        assert!(!fx.videos_dir().join("3H_0_unc.mp4").exists());
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let fx = Fixture::new();
        fx.add_source("a.mp4", 10);
        fx.add_source("b.mov", 10);
        let transcoder = FakeTranscoder {
            fail_remux: true,
            ..Default::default()
        };
        let organizer = Organizer::new(fx.settings(), transcoder);
        let sources = scan_sources(&fx.source_dir).unwrap();

        let report = organizer.organize_batch(&sources, club("9"), &running());

        assert_eq!(report.processed(), 2);
        assert_eq!(report.organized.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].source.ends_with("b.mov"));
        assert!(!report.is_success());
        assert!(fx.source_dir.join("b.mov").exists());
    }

    #[test]
    fn test_delete_original() {
        let fx = Fixture::new();
        let src = fx.add_source("IMG_0003.MOV", 10);
        let mut settings = fx.settings();
        settings.delete_original = true;
        let organizer = Organizer::new(settings, FakeTranscoder::default());

        let sources = scan_sources(&src).unwrap();
        let video = organizer.organize_one(&sources[0], club("A")).unwrap();

        assert!(video.original_deleted);
        assert!(!src.exists());
        assert!(video.output.exists());
    }

    #[test]
    fn test_interrupted_batch_stops_early() {
        let fx = Fixture::new();
        fx.add_source("a.mov", 10);
        let organizer = Organizer::new(fx.settings(), FakeTranscoder::default());
        let sources = scan_sources(&fx.source_dir).unwrap();

        let report = organizer.organize_batch(&sources, club("G"), &AtomicBool::new(false));

        assert!(report.interrupted);
        assert_eq!(report.processed(), 0);
        assert!(!fx.root.exists());
    }

    #[test]
    fn test_shutdown_during_conversion_finishes_current_video() {
        let fx = Fixture::new();
        fx.add_source("a.mov", 10);
        fx.add_source("b.mov", 10);
        let running = Arc::new(AtomicBool::new(true));
        let transcoder = FakeTranscoder {
            running: Some(running.clone()),
            ..Default::default()
        };
        let organizer = Organizer::new(fx.settings(), transcoder);
        let sources = scan_sources(&fx.source_dir).unwrap();

        let report = organizer.organize_batch(&sources, club("7"), &running);

        assert!(report.interrupted);
        assert!(report.failed.is_empty());
        assert_eq!(report.organized.len(), 1);
        assert!(fx.videos_dir().join("7_0.mp4").exists());
        assert!(!fx.videos_dir().join("7_1.mp4").exists());
        assert_eq!(*organizer.transcoder.calls.borrow(), vec!["remux"]);
    }

    #[test]
    fn test_capture_date_sessions() {
        let fx = Fixture::new();
        let src = fx.add_source("a.mov", 10);
        let mut settings = fx.settings();
        settings.session_date = SessionDate::Capture;
        let organizer = Organizer::new(settings, FakeTranscoder::default());

        let sources = scan_sources(&src).unwrap();
        let session = organizer.session_for(&sources[0]);
        assert_eq!(session.date(), sources[0].captured_at.date_naive());
    }
}
