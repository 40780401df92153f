//! Golfhelper - organize golf swing videos
//!
//! Converts phone recordings to MP4 and files them into dated session
//! folders, ready for a browser-based swing analyzer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use golfhelper_core::colored_logger::{init_component_logger, Component};
use golfhelper_core::config::{expand_tilde, resolve_config_path, Config, SessionDate};
use golfhelper_core::organizer::{BatchReport, OrganizeSettings, Organizer};
use golfhelper_library::{list_sessions, scan_sources, Club, SessionSummary};
use golfhelper_processing::transcoder::{check_ffmpeg, ffmpeg_version};
use golfhelper_processing::FfmpegTranscoder;

#[derive(Parser)]
#[command(name = "golfhelper")]
#[command(about = "Helper for organizing golf swing videos")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (includes ffmpeg output)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the root directory to save golf videos
    #[command(alias = "setup-tool")]
    Setup {
        /// Root directory for golf videos (defaults to a Golf folder in the videos directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Clips larger than this are downscaled
        #[arg(long, default_value = "5")]
        max_video_size_mb: u64,

        /// Path to the ffmpeg binary (defaults to ffmpeg on PATH)
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// Date used to name session folders
        #[arg(long, value_enum, default_value_t = SessionDate::Today)]
        session_date: SessionDate,
    },

    /// Convert videos and file them into their session folder
    Organize {
        /// Video file, or folder of videos, to organize
        source: PathBuf,

        /// Club used in the video (L S G A P, 1-9, 7W 5W 4W 3W, 5H 4H 3H, D)
        #[arg(long)]
        club: Club,

        /// Library root, overriding the configured one
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Delete each original once its clip is saved
        #[arg(long)]
        delete_original: bool,

        /// Name the session after the recording date instead of today
        #[arg(long)]
        capture_date: bool,
    },

    /// Show configuration and recorded sessions
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Check dependencies (FFmpeg, config, root directory)
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let component = match cli.command {
        Commands::Setup { .. } => Component::Setup,
        Commands::Organize { .. } => Component::Organize,
        Commands::Status { .. } => Component::Status,
        Commands::Check => Component::Check,
    };
    init_component_logger(component, cli.verbose)?;

    let config_path = resolve_config_path(cli.config)?;

    match cli.command {
        Commands::Setup {
            root,
            max_video_size_mb,
            ffmpeg,
            session_date,
        } => {
            cmd_setup(&config_path, root, max_video_size_mb, ffmpeg, session_date)?;
        }
        Commands::Organize {
            source,
            club,
            root,
            delete_original,
            capture_date,
        } => {
            cmd_organize(&config_path, source, club, root, delete_original, capture_date)?;
        }
        Commands::Status { json } => {
            cmd_status(&config_path, json)?;
        }
        Commands::Check => {
            cmd_check(&config_path)?;
        }
    }

    Ok(())
}

fn cmd_setup(
    config_path: &Path,
    root: Option<PathBuf>,
    max_video_size_mb: u64,
    ffmpeg: Option<PathBuf>,
    session_date: SessionDate,
) -> Result<()> {
    let root = root.map(expand_tilde).unwrap_or_else(|| Config::default().root);

    info!("configuring golf helper root directory to {:?}", root);
    std::fs::create_dir_all(&root)
        .with_context(|| format!("failed to create root directory {:?}", root))?;

    let config = Config {
        root,
        max_video_size_mb,
        ffmpeg_path: ffmpeg.map(expand_tilde),
        session_date,
    };
    config.save(config_path)?;

    info!("config written to {:?}", config_path);

    if !check_ffmpeg(&config.ffmpeg_binary()) {
        warn!("ffmpeg not found - run 'golfhelper check' for details");
    }

    info!("finished setup");
    Ok(())
}

fn cmd_organize(
    config_path: &Path,
    source: PathBuf,
    club: Club,
    root: Option<PathBuf>,
    delete_original: bool,
    capture_date: bool,
) -> Result<()> {
    let mut config = Config::from_file(config_path)?;
    if let Some(root) = root {
        config.root = expand_tilde(root);
    }
    if capture_date {
        config.session_date = SessionDate::Capture;
    }

    let source = expand_tilde(source);
    let sources = scan_sources(&source)?;
    if sources.is_empty() {
        warn!("no .mov or .mp4 videos found in {:?}", source);
        return Ok(());
    }

    let ffmpeg = config.ffmpeg_binary();
    if !check_ffmpeg(&ffmpeg) {
        error!("ffmpeg not found at {:?} - please install FFmpeg", ffmpeg);
        return Err(anyhow::anyhow!("FFmpeg not found"));
    }

    info!("library root: {:?}", config.root);
    info!("club: {}, video(s): {}", club, sources.len());

    // Finish the current file, then stop
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("received shutdown signal, stopping after the current video...");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut settings = OrganizeSettings::from_config(&config, chrono::Local::now().date_naive());
    settings.delete_original = delete_original;

    let organizer = Organizer::new(settings, FfmpegTranscoder::new(ffmpeg));
    let report = organizer.organize_batch(&sources, club, &running);

    print_report(&report, sources.len());

    if !report.failed.is_empty() {
        return Err(anyhow::anyhow!(
            "{} of {} video(s) failed to organize",
            report.failed.len(),
            sources.len()
        ));
    }

    Ok(())
}

fn print_report(report: &BatchReport, total: usize) {
    println!("organized {} of {} video(s)", report.organized.len(), total);

    for video in &report.organized {
        println!(
            "  {} -> {}{}{}",
            video.source.display(),
            video.output.display(),
            if video.compressed { " (compressed)" } else { "" },
            if video.original_deleted { " (original deleted)" } else { "" }
        );
    }

    if !report.failed.is_empty() {
        println!("\nfailed (originals left in place):");
        for failed in &report.failed {
            println!("  {}: {}", failed.source.display(), failed.error);
        }
    }

    if report.interrupted {
        println!("\ninterrupted: {} video(s) not processed", total - report.processed());
    }
}

#[derive(Serialize)]
struct StatusReport<'a> {
    config_path: &'a Path,
    config: &'a Config,
    sessions: Vec<SessionSummary>,
}

fn cmd_status(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path)?;

    let sessions = if config.root.is_dir() {
        list_sessions(&config.root)?
    } else {
        warn!("root directory {:?} does not exist", config.root);
        Vec::new()
    };

    if json {
        let report = StatusReport {
            config_path,
            config: &config,
            sessions,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("config: {:?}", config_path);
    println!("root: {:?}", config.root);
    println!("max video size: {} MB", config.max_video_size_mb);
    println!("session date: {:?}", config.session_date);
    println!("sessions: {}", sessions.len());

    for session in &sessions {
        let clubs: Vec<String> = session
            .clips
            .iter()
            .map(|(club, count)| format!("{} x{}", club, count))
            .collect();
        println!(
            "  {}  {} clip(s)  {}",
            session.name,
            session.total_clips(),
            clubs.join(", ")
        );
    }

    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<()> {
    println!("checking dependencies...\n");

    let config = match Config::from_file(config_path) {
        Ok(config) => {
            println!("  config: OK ({})", config_path.display());
            Some(config)
        }
        Err(e) => {
            println!("  config: {:#}", e);
            None
        }
    };

    let ffmpeg = config
        .as_ref()
        .map(Config::ffmpeg_binary)
        .unwrap_or_else(|| PathBuf::from("ffmpeg"));
    let version = ffmpeg_version(&ffmpeg);
    println!(
        "  ffmpeg: {}",
        version.as_deref().unwrap_or("NOT FOUND")
    );

    if let Some(config) = &config {
        println!(
            "  root:   {}",
            if config.root.is_dir() { "OK" } else { "missing (will be created)" }
        );
    }

    println!();

    if version.is_none() {
        println!("WARNING: FFmpeg is required for video conversion.");
        println!("Please install FFmpeg and ensure it's in your PATH.");
        println!("Download: https://ffmpeg.org/download.html");
    } else if config.is_none() {
        println!("run 'golfhelper setup --root <dir>' to get started");
    } else {
        println!("all checks passed!");
    }

    Ok(())
}
