use std::path::PathBuf;

use clap::{Parser, Subcommand};
use socialgrab_core::models::media::{MediaKind, QualityHint};

#[derive(Parser, Debug)]
#[command(name = "socialgrab")]
#[command(about = "Download video, audio and subtitles from social media platforms")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show supported platforms and engine versions
    #[arg(long)]
    pub about: bool,

    /// Without a command the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a single URL
    Download {
        url: String,
        /// Extract audio only
        #[arg(long, conflicts_with = "subtitles")]
        audio: bool,
        /// Download subtitles only
        #[arg(long)]
        subtitles: bool,
        /// best, a height such as 720 or 720p, ask, or an engine format id
        #[arg(short, long, default_value = "best", value_parser = parse_quality)]
        quality: QualityHint,
        /// Existing directory to save into
        #[arg(short, long, env = "SOCIALGRAB_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Download every URL in a file, one per line (stdin when no file)
    Batch {
        file: Option<PathBuf>,
        /// Extract audio only
        #[arg(long)]
        audio: bool,
        /// Quality applied to every video in the batch
        #[arg(short, long, default_value = "best", value_parser = parse_quality)]
        quality: QualityHint,
        /// Existing directory to save into
        #[arg(short, long, env = "SOCIALGRAB_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },

    /// List the video qualities available for a URL
    Probe { url: String },
}

fn parse_quality(value: &str) -> Result<QualityHint, String> {
    Ok(QualityHint::parse(value))
}

pub fn media_kind(audio: bool, subtitles: bool) -> MediaKind {
    match (audio, subtitles) {
        (true, _) => MediaKind::Audio,
        (_, true) => MediaKind::Subtitles,
        _ => MediaKind::Video,
    }
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}
