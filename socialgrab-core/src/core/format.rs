use std::fmt;

use crate::core::engine::ExtractionEngine;
use crate::error::DownloadError;
use crate::models::media::{MediaKind, MediaMetadata, QualityHint, QualityOption, QualityRequest};

/// How many distinct heights are offered when the user picks interactively.
pub const MAX_OFFERED_HEIGHTS: usize = 4;

const BEST_AUDIO: &str = "bestaudio/best";
const BEST_PRIMARY_VIDEO: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";
const BEST_GENERIC: &str = "best";

/// Engine-specific stream selection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatExpression(String);

impl FormatExpression {
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the user picked from the offered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualitySelection {
    Best,
    /// Index into the offered options.
    Option(usize),
    Manual(String),
}

/// Presentation hook for the "list qualities, pick one" flow.
pub trait QualityPrompt: Send {
    fn choose(&mut self, options: &[QualityOption]) -> QualitySelection;
}

/// Outcome of an interactive negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityChoice {
    Best,
    Probed(QualityOption),
    Manual(String),
}

impl QualityChoice {
    pub fn into_request(self) -> QualityRequest {
        match self {
            Self::Best => QualityRequest::Best,
            Self::Probed(option) => QualityRequest::ProbedId(option.format_id),
            Self::Manual(id) => QualityRequest::FormatId(id),
        }
    }

    /// Hint reused across a batch. A probed option only makes sense for the
    /// source it was probed from, so other items get its height as a ceiling.
    pub fn into_batch_hint(self) -> QualityHint {
        match self {
            Self::Best => QualityHint::Best,
            Self::Probed(option) => QualityHint::MaxHeight(option.height_px),
            Self::Manual(id) => QualityHint::Manual(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormatNegotiator {
    primary: String,
}

impl FormatNegotiator {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
        }
    }

    pub fn select_format(
        &self,
        platform: &str,
        media_kind: MediaKind,
        request: &QualityRequest,
    ) -> Option<FormatExpression> {
        let expr = match media_kind {
            MediaKind::Subtitles => return None,
            // Normalising the codec is the transcoding step's job.
            MediaKind::Audio => BEST_AUDIO.to_string(),
            MediaKind::Video => match request {
                QualityRequest::Best if platform == self.primary => BEST_PRIMARY_VIDEO.to_string(),
                QualityRequest::Best => BEST_GENERIC.to_string(),
                QualityRequest::MaxHeight(h) => {
                    format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best")
                }
                QualityRequest::ProbedId(id) => format!("{id}+bestaudio/{id}"),
                QualityRequest::FormatId(id) => id.clone(),
            },
        };
        Some(FormatExpression(expr))
    }

    /// Distinct video heights, tallest first, first-seen format kept per height.
    pub fn quality_options(metadata: &MediaMetadata) -> Vec<QualityOption> {
        let mut options: Vec<QualityOption> = metadata
            .formats
            .iter()
            .filter(|f| f.has_video())
            .filter_map(|f| {
                let height = f.height.filter(|h| *h > 0)?;
                Some(QualityOption {
                    height_px: height,
                    container: f.ext.clone(),
                    format_id: f.format_id.clone(),
                    note: f.format_note.clone().unwrap_or_default(),
                })
            })
            .collect();

        options.sort_by(|a, b| b.height_px.cmp(&a.height_px));
        options.dedup_by_key(|o| o.height_px);
        options
    }

    pub async fn probe(
        &self,
        engine: &dyn ExtractionEngine,
        url: &str,
    ) -> Result<Vec<QualityOption>, DownloadError> {
        let metadata = engine
            .probe(url)
            .await
            .map_err(|e| DownloadError::ProbeFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::quality_options(&metadata))
    }

    /// Probes the source and asks the user. Never fails: an unusable probe
    /// degrades to best quality.
    pub async fn choose_interactively(
        &self,
        engine: &dyn ExtractionEngine,
        prompt: &mut (dyn QualityPrompt + '_),
        url: &str,
    ) -> QualityChoice {
        let mut options = match self.probe(engine, url).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!("{}; using best quality", e);
                return QualityChoice::Best;
            }
        };

        if options.is_empty() {
            tracing::warn!("No video qualities found for {}; using best quality", url);
            return QualityChoice::Best;
        }

        options.truncate(MAX_OFFERED_HEIGHTS);
        match prompt.choose(&options) {
            QualitySelection::Best => QualityChoice::Best,
            QualitySelection::Option(i) => match options.get(i) {
                Some(option) => QualityChoice::Probed(option.clone()),
                None => {
                    tracing::warn!("Quality choice {} out of range; using best quality", i);
                    QualityChoice::Best
                }
            },
            QualitySelection::Manual(id) if id.trim().is_empty() => QualityChoice::Best,
            QualitySelection::Manual(id) => QualityChoice::Manual(id.trim().to_string()),
        }
    }

    /// Turns a user hint into a concrete request.
    pub async fn negotiate(
        &self,
        engine: &dyn ExtractionEngine,
        prompt: Option<&mut (dyn QualityPrompt + '_)>,
        media_kind: MediaKind,
        hint: &QualityHint,
        url: &str,
    ) -> QualityRequest {
        if media_kind != MediaKind::Video {
            return QualityRequest::Best;
        }
        match hint {
            QualityHint::Best => QualityRequest::Best,
            QualityHint::MaxHeight(h) => QualityRequest::MaxHeight(*h),
            QualityHint::Manual(id) => QualityRequest::FormatId(id.clone()),
            QualityHint::Interactive => match prompt {
                Some(prompt) => self
                    .choose_interactively(engine, prompt, url)
                    .await
                    .into_request(),
                None => {
                    tracing::debug!("No quality prompt available; using best quality");
                    QualityRequest::Best
                }
            },
        }
    }
}
