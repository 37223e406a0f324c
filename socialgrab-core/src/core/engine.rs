use std::path::PathBuf;

use async_trait::async_trait;

use crate::core::format::FormatExpression;
use crate::core::progress::ProgressTracker;
use crate::models::media::MediaMetadata;

/// Media-kind specific post-processing asked of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaDirectives {
    Video,
    ExtractAudio {
        codec: String,
        quality: String,
        embed_metadata: bool,
    },
    SubtitlesOnly {
        langs: Vec<String>,
        format: String,
    },
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// `None` when no media stream is downloaded (subtitles).
    pub format: Option<FormatExpression>,
    pub output_template: PathBuf,
    pub directives: MediaDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// File name the engine prepared for the media, before post-processing
    /// renames it.
    pub filename: PathBuf,
}

/// The external extraction/transcoding engine.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Metadata only, nothing is downloaded.
    async fn probe(&self, url: &str) -> anyhow::Result<MediaMetadata>;

    async fn fetch(
        &self,
        url: &str,
        request: &FetchRequest,
        progress: &ProgressTracker,
    ) -> anyhow::Result<FetchResult>;
}
