use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{DownloadError, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub id: String,
    pub domain_markers: Vec<String>,
}

impl PlatformEntry {
    pub fn new(id: &str, markers: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            domain_markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Subtitles,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Subtitles => write!(f, "subtitles"),
        }
    }
}

/// What the user asked for, before negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityHint {
    Best,
    MaxHeight(u32),
    /// Probe the source and let the user pick.
    Interactive,
    Manual(String),
}

impl QualityHint {
    pub fn parse(value: &str) -> Self {
        let s = value.trim().to_lowercase();
        match s.as_str() {
            "" | "best" | "highest" => Self::Best,
            "ask" => Self::Interactive,
            _ => match s.trim_end_matches('p').parse::<u32>() {
                Ok(h) if h > 0 => Self::MaxHeight(h),
                _ => Self::Manual(value.trim().to_string()),
            },
        }
    }
}

impl fmt::Display for QualityHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => write!(f, "best"),
            Self::MaxHeight(h) => write!(f, "{}p", h),
            Self::Interactive => write!(f, "ask"),
            Self::Manual(id) => write!(f, "{}", id),
        }
    }
}

/// A negotiated quality, ready to be turned into a format expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityRequest {
    Best,
    MaxHeight(u32),
    /// Picked from a probe of this source. May name a video-only stream.
    ProbedId(String),
    /// Typed by the user, passed to the engine untouched.
    FormatId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub media_kind: MediaKind,
    pub quality: QualityHint,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, media_kind: MediaKind, quality: QualityHint) -> Self {
        Self {
            url: url.into(),
            media_kind,
            quality,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityOption {
    pub height_px: u32,
    pub container: String,
    pub format_id: String,
    pub note: String,
}

impl QualityOption {
    pub fn label(&self) -> String {
        if self.note.is_empty() {
            format!("{}p ({})", self.height_px, self.container)
        } else {
            format!("{}p ({}, {})", self.height_px, self.container, self.note)
        }
    }
}

/// Raw format entry as reported by the engine's metadata probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub height: Option<u32>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub format_note: Option<String>,
}

impl FormatInfo {
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().map(|v| v != "none").unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub formats: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub succeeded: bool,
    pub final_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub failure: Option<FailureKind>,
}

impl DownloadOutcome {
    pub fn completed(final_path: PathBuf) -> Self {
        Self {
            succeeded: true,
            final_path: Some(final_path),
            error_message: None,
            failure: None,
        }
    }

    pub fn failed(err: &DownloadError) -> Self {
        Self {
            succeeded: false,
            final_path: None,
            error_message: Some(err.to_string()),
            failure: Some(err.failure_kind()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub total: usize,
    pub succeeded: usize,
}

impl BatchTally {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_best_variants() {
        assert_eq!(QualityHint::parse("best"), QualityHint::Best);
        assert_eq!(QualityHint::parse(" BEST "), QualityHint::Best);
        assert_eq!(QualityHint::parse(""), QualityHint::Best);
    }

    #[test]
    fn hint_height_with_and_without_suffix() {
        assert_eq!(QualityHint::parse("720"), QualityHint::MaxHeight(720));
        assert_eq!(QualityHint::parse("1080p"), QualityHint::MaxHeight(1080));
    }

    #[test]
    fn hint_ask_is_interactive() {
        assert_eq!(QualityHint::parse("ask"), QualityHint::Interactive);
    }

    #[test]
    fn hint_other_text_is_manual_format() {
        assert_eq!(
            QualityHint::parse("137+140"),
            QualityHint::Manual("137+140".into())
        );
        assert_eq!(QualityHint::parse("0"), QualityHint::Manual("0".into()));
    }

    #[test]
    fn platform_entry_lowercases_markers() {
        let entry = PlatformEntry::new("x", &["YouTube.COM"]);
        assert_eq!(entry.domain_markers, vec!["youtube.com".to_string()]);
    }

    #[test]
    fn failed_outcome_has_no_path() {
        let outcome =
            DownloadOutcome::failed(&DownloadError::UnsupportedPlatform("u".into()));
        assert!(!outcome.succeeded);
        assert!(outcome.final_path.is_none());
        assert_eq!(outcome.failure, Some(FailureKind::UnsupportedPlatform));
    }
}
