//! Video conversion using FFmpeg
//!
//! Two operations are needed when filing a swing video:
//! - Remux: move the streams into an MP4 container without re-encoding
//! - Downscale: halve the resolution to bring large clips under the size limit

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::error::TranscodeError;

/// Number of stderr characters kept in a failure report
const STDERR_TAIL_CHARS: usize = 500;

/// Converts a video file into another file
pub trait Transcoder {
    /// Change the container to MP4, copying audio and video streams as-is
    fn remux(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;

    /// Re-encode at half the width, keeping the aspect ratio
    fn downscale(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// Transcoder that shells out to an `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, input: &Path, output: &Path, args: Vec<OsString>) -> Result<(), TranscodeError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Keep terminal Ctrl+C away from ffmpeg so the current clip can finish
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        debug!("running ffmpeg: {:?}", cmd);

        let result = cmd.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TranscodeError::NotFound(self.binary.display().to_string())
            } else {
                TranscodeError::Spawn(e)
            }
        })?;

        // ffmpeg writes its progress to stderr
        for line in String::from_utf8_lossy(&result.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&result.stderr).lines())
        {
            let line = line.trim();
            if !line.is_empty() {
                debug!("ffmpeg: {}", line);
            }
        }

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TranscodeError::Failed {
                path: input.to_path_buf(),
                status: result.status.to_string(),
                stderr: tail(&stderr, STDERR_TAIL_CHARS),
            });
        }

        if !output.exists() {
            return Err(TranscodeError::MissingOutput(output.to_path_buf()));
        }

        Ok(())
    }
}

impl Transcoder for FfmpegTranscoder {
    fn remux(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        info!("converting {:?} from mov to mp4", input.file_name().unwrap_or_default());
        self.run(input, output, remux_args(input, output))
    }

    fn downscale(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        info!("compressing {:?}", input.file_name().unwrap_or_default());
        self.run(input, output, downscale_args(input, output))
    }
}

/// Arguments for a stream-copy container change
pub fn remux_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(["-c:v", "copy", "-c:a", "copy"].map(OsString::from));
    args.push(output.into());
    args
}

/// Arguments for a half-resolution re-encode
///
/// `-2` keeps the height even, which the H.264 encoder requires.
pub fn downscale_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(["-vf", "scale=iw/2:-2", "-strict", "-2"].map(OsString::from));
    args.push(output.into());
    args
}

/// Keep the last `max_chars` characters, where ffmpeg puts the actual error
fn tail(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

/// Check if FFmpeg is available
pub fn check_ffmpeg(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First line of `ffmpeg -version`, e.g. "ffmpeg version 6.1.1 ..."
pub fn ffmpeg_version(binary: &Path) -> Option<String> {
    let output = Command::new(binary).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
