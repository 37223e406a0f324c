use std::path::PathBuf;

use crate::core::directory::OutputDir;
use crate::core::engine::{ExtractionEngine, FetchRequest, MediaDirectives};
use crate::core::events::DownloadEvents;
use crate::core::filename::FilenamePolicy;
use crate::core::format::{FormatNegotiator, QualityPrompt};
use crate::core::progress::ProgressTracker;
use crate::core::registry::PlatformRegistry;
use crate::error::DownloadError;
use crate::models::media::{DownloadOutcome, DownloadRequest, MediaKind, QualityRequest};
use crate::models::settings::DownloadSettings;

const FORMAT_UNAVAILABLE: &str = "requested format is not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    PlatformResolved,
    PathResolved,
    FormatResolved,
    Engaged,
    Completed,
    Failed,
}

/// Read-only collaborators shared by every request of a session.
#[derive(Clone, Copy)]
pub struct DownloadContext<'a> {
    pub registry: &'a PlatformRegistry,
    pub filenames: &'a FilenamePolicy,
    pub negotiator: &'a FormatNegotiator,
    pub settings: &'a DownloadSettings,
    pub output_dir: &'a OutputDir,
    pub engine: &'a dyn ExtractionEngine,
    pub events: &'a dyn DownloadEvents,
}

/// Drives a single request through detection, naming, format negotiation and
/// the engine call. Consumed by [`DownloadOrchestrator::run`].
pub struct DownloadOrchestrator<'a> {
    ctx: DownloadContext<'a>,
    state: OrchestratorState,
}

impl<'a> DownloadOrchestrator<'a> {
    pub fn new(ctx: DownloadContext<'a>) -> Self {
        Self {
            ctx,
            state: OrchestratorState::Idle,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    fn advance(&mut self, next: OrchestratorState) {
        tracing::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub async fn run(
        mut self,
        request: &DownloadRequest,
        prompt: Option<&mut (dyn QualityPrompt + '_)>,
    ) -> DownloadOutcome {
        let outcome = match self.drive(request, prompt).await {
            Ok(path) => {
                self.advance(OrchestratorState::Completed);
                DownloadOutcome::completed(path)
            }
            Err(e) => {
                self.advance(OrchestratorState::Failed);
                DownloadOutcome::failed(&e)
            }
        };
        self.ctx.events.finished(&request.url, &outcome);
        outcome
    }

    async fn drive(
        &mut self,
        request: &DownloadRequest,
        prompt: Option<&mut (dyn QualityPrompt + '_)>,
    ) -> Result<PathBuf, DownloadError> {
        let ctx = self.ctx;
        let url = request.url.trim();
        let kind = request.media_kind;

        let platform = ctx
            .registry
            .detect(url)
            .ok_or_else(|| DownloadError::UnsupportedPlatform(url.to_string()))?;
        self.advance(OrchestratorState::PlatformResolved);

        if kind == MediaKind::Subtitles && !ctx.registry.is_primary(platform) {
            return Err(DownloadError::SubtitlesUnsupported {
                platform: platform.to_string(),
                primary: ctx.registry.primary().to_string(),
            });
        }
        let template = ctx.filenames.output_template(platform, kind, None);
        let output_template = ctx.output_dir.template_path(&template);
        self.advance(OrchestratorState::PathResolved);

        let quality = ctx
            .negotiator
            .negotiate(ctx.engine, prompt, kind, &request.quality, url)
            .await;
        let format = ctx.negotiator.select_format(platform, kind, &quality);
        self.advance(OrchestratorState::FormatResolved);

        let fetch = FetchRequest {
            format,
            output_template,
            directives: directives_for(kind, ctx.settings),
        };
        tracing::debug!(
            "Fetching {} from {} via {} with format {:?} into {}",
            kind,
            platform,
            ctx.engine.name(),
            fetch.format.as_ref().map(|f| f.as_str()),
            fetch.output_template.display()
        );

        let tracker = ProgressTracker::new();
        ctx.events.engaged(url, tracker.subscribe());
        self.advance(OrchestratorState::Engaged);

        let result = ctx
            .engine
            .fetch(url, &fetch, &tracker)
            .await
            .map_err(|e| classify_engine_error(e, &quality))?;

        Ok(final_path(kind, result.filename, ctx.settings))
    }
}

fn directives_for(kind: MediaKind, settings: &DownloadSettings) -> MediaDirectives {
    match kind {
        MediaKind::Video => MediaDirectives::Video,
        MediaKind::Audio => MediaDirectives::ExtractAudio {
            codec: settings.audio_codec.clone(),
            quality: settings.audio_quality.clone(),
            embed_metadata: true,
        },
        MediaKind::Subtitles => MediaDirectives::SubtitlesOnly {
            langs: settings.subtitle_langs.clone(),
            format: settings.subtitle_format.clone(),
        },
    }
}

/// The engine reports the name it prepared before post-processing; audio
/// extraction and subtitle writing change the extension afterwards.
fn final_path(kind: MediaKind, prepared: PathBuf, settings: &DownloadSettings) -> PathBuf {
    match kind {
        MediaKind::Video => prepared,
        MediaKind::Audio => prepared.with_extension(&settings.audio_codec),
        MediaKind::Subtitles => {
            let lang = settings
                .subtitle_langs
                .first()
                .map(String::as_str)
                .unwrap_or("en");
            prepared.with_extension(format!("{}.{}", lang, settings.subtitle_format))
        }
    }
}

fn classify_engine_error(err: anyhow::Error, quality: &QualityRequest) -> DownloadError {
    let message = err.to_string();
    match quality {
        QualityRequest::FormatId(format)
            if message.to_lowercase().contains(FORMAT_UNAVAILABLE) =>
        {
            DownloadError::InvalidManualFormat {
                format: format.clone(),
                message,
            }
        }
        _ => DownloadError::EngineFailure(message),
    }
}
