use std::borrow::Cow;

use crate::core::format::QualityPrompt;
use crate::core::orchestrator::{DownloadContext, DownloadOrchestrator};
use crate::models::media::{BatchTally, DownloadRequest, MediaKind, QualityHint};

/// Sequential batch driver. Per-item outcomes go to the context's events and
/// are not retained.
pub struct BatchRunner<'a> {
    ctx: DownloadContext<'a>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(ctx: DownloadContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn run(
        &self,
        requests: &[DownloadRequest],
        prompt: Option<&mut (dyn QualityPrompt + '_)>,
    ) -> BatchTally {
        let pending: Vec<&DownloadRequest> = requests.iter().filter(|r| !r.is_blank()).collect();
        let mut tally = BatchTally {
            total: pending.len(),
            succeeded: 0,
        };

        // Quality is negotiated once against the first URL on a supported
        // platform and reused for every interactive video item. Later items
        // are never probed.
        let first_supported = pending
            .iter()
            .find(|r| self.ctx.registry.detect(&r.url).is_some());
        let shared_hint = match (first_supported, prompt) {
            (Some(first), Some(prompt)) if asks_for_quality(first) => {
                let choice = self
                    .ctx
                    .negotiator
                    .choose_interactively(self.ctx.engine, prompt, first.url.trim())
                    .await;
                let hint = choice.into_batch_hint();
                tracing::info!("Using quality {} for the whole batch", hint);
                Some(hint)
            }
            _ => None,
        };

        for (i, request) in pending.iter().enumerate() {
            self.ctx
                .events
                .item_started(i + 1, tally.total, request.url.trim());

            let request = match &shared_hint {
                Some(hint) if asks_for_quality(request) => Cow::Owned(DownloadRequest::new(
                    request.url.clone(),
                    request.media_kind,
                    hint.clone(),
                )),
                _ => Cow::Borrowed(*request),
            };

            let outcome = DownloadOrchestrator::new(self.ctx).run(&request, None).await;
            if outcome.succeeded {
                tally.succeeded += 1;
            }
        }

        self.ctx.events.batch_finished(&tally);
        tally
    }
}

fn asks_for_quality(request: &DownloadRequest) -> bool {
    request.media_kind == MediaKind::Video && request.quality == QualityHint::Interactive
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::directory::{DirectoryResolver, HostInfo, OsFamily, OutputDir};
    use crate::core::engine::fake::FakeEngine;
    use crate::core::events::DownloadEvents;
    use crate::core::filename::FilenamePolicy;
    use crate::core::format::{FormatNegotiator, QualitySelection};
    use crate::core::registry::PlatformRegistry;
    use crate::models::media::{DownloadOutcome, FormatInfo, MediaMetadata, QualityOption};
    use crate::models::settings::Settings;

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<(usize, usize, String)>>,
        outcomes: Mutex<Vec<bool>>,
        tallies: Mutex<Vec<BatchTally>>,
    }

    impl DownloadEvents for Recorder {
        fn finished(&self, _url: &str, outcome: &DownloadOutcome) {
            self.outcomes.lock().unwrap().push(outcome.succeeded);
        }

        fn item_started(&self, index: usize, total: usize, url: &str) {
            self.started
                .lock()
                .unwrap()
                .push((index, total, url.to_string()));
        }

        fn batch_finished(&self, tally: &BatchTally) {
            self.tallies.lock().unwrap().push(*tally);
        }
    }

    struct Counting {
        asked: usize,
    }

    impl QualityPrompt for Counting {
        fn choose(&mut self, _options: &[QualityOption]) -> QualitySelection {
            self.asked += 1;
            QualitySelection::Option(0)
        }
    }

    struct Env {
        settings: Settings,
        registry: PlatformRegistry,
        filenames: FilenamePolicy,
        negotiator: FormatNegotiator,
        output_dir: OutputDir,
        _dir: tempfile::TempDir,
    }

    fn env() -> Env {
        let dir = tempfile::tempdir().unwrap();
        let host = HostInfo {
            os: OsFamily::Linux,
            mobile_runtime: false,
            home_dir: None,
            user_profile: None,
            current_dir: dir.path().to_path_buf(),
        };
        let settings = Settings::default();
        Env {
            registry: PlatformRegistry::from_settings(&settings.platforms),
            filenames: FilenamePolicy::from_settings(&settings),
            negotiator: FormatNegotiator::new("youtube"),
            output_dir: DirectoryResolver::new().set_custom(&host, dir.path()).unwrap(),
            settings,
            _dir: dir,
        }
    }

    fn ctx<'a>(env: &'a Env, engine: &'a FakeEngine, events: &'a Recorder) -> DownloadContext<'a> {
        DownloadContext {
            registry: &env.registry,
            filenames: &env.filenames,
            negotiator: &env.negotiator,
            settings: &env.settings.download,
            output_dir: &env.output_dir,
            engine,
            events,
        }
    }

    fn video(url: &str, quality: QualityHint) -> DownloadRequest {
        DownloadRequest::new(url, MediaKind::Video, quality)
    }

    #[tokio::test]
    async fn blanks_are_skipped_and_failures_counted() {
        let env = env();
        let engine = FakeEngine::new()
            .then_ok("one.mp4")
            .then_err("ERROR: HTTP Error 403: Forbidden");
        let events = Recorder::default();
        let requests = vec![
            video("", QualityHint::Best),
            video("https://vimeo.com/1", QualityHint::Best),
            video("   ", QualityHint::Best),
            video("https://vimeo.com/2", QualityHint::Best),
        ];

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&requests, None)
            .await;

        assert_eq!(tally, BatchTally { total: 2, succeeded: 1 });
        assert_eq!(tally.failed(), 1);
        assert_eq!(engine.fetch_count(), 2);
        assert_eq!(*events.outcomes.lock().unwrap(), vec![true, false]);
        assert_eq!(*events.tallies.lock().unwrap(), vec![tally]);
        let started = events.started.lock().unwrap();
        assert_eq!(started[0], (1, 2, "https://vimeo.com/1".to_string()));
        assert_eq!(started[1], (2, 2, "https://vimeo.com/2".to_string()));
    }

    #[tokio::test]
    async fn unsupported_item_does_not_abort_batch() {
        let env = env();
        let engine = FakeEngine::new().then_ok("a.mp4");
        let events = Recorder::default();
        let requests = vec![
            video("https://example-unknown.test/x", QualityHint::Best),
            video("https://youtu.be/a", QualityHint::Best),
        ];

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&requests, None)
            .await;

        assert_eq!(tally, BatchTally { total: 2, succeeded: 1 });
        assert_eq!(engine.fetch_count(), 1);
    }

    #[tokio::test]
    async fn empty_batch_reports_zero() {
        let env = env();
        let engine = FakeEngine::new();
        let events = Recorder::default();

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&[video(" ", QualityHint::Best)], None)
            .await;

        assert_eq!(tally, BatchTally::default());
        assert_eq!(events.tallies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn interactive_quality_is_negotiated_once() {
        let env = env();
        let engine = FakeEngine::new()
            .with_metadata(MediaMetadata {
                title: None,
                formats: vec![FormatInfo {
                    format_id: "22".into(),
                    ext: "mp4".into(),
                    height: Some(720),
                    vcodec: Some("avc1".into()),
                    ..Default::default()
                }],
            })
            .then_ok("a.mp4")
            .then_ok("b.mp4")
            .then_ok("c.mp4");
        let events = Recorder::default();
        let requests = vec![
            video("https://youtu.be/a", QualityHint::Interactive),
            video("https://youtu.be/b", QualityHint::Interactive),
            video("https://youtu.be/c", QualityHint::Interactive),
        ];
        let mut prompt = Counting { asked: 0 };

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&requests, Some(&mut prompt))
            .await;

        assert_eq!(tally.succeeded, 3);
        assert_eq!(prompt.asked, 1);
        assert_eq!(engine.probe_count(), 1);
        let fetches = engine.fetches.lock().unwrap();
        for (_, fetch) in fetches.iter() {
            assert_eq!(
                fetch.format.as_ref().unwrap().as_str(),
                "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
            );
        }
    }

    #[tokio::test]
    async fn quality_is_taken_from_first_supported_url() {
        let env = env();
        let engine = FakeEngine::new()
            .with_metadata(MediaMetadata {
                title: None,
                formats: vec![FormatInfo {
                    format_id: "22".into(),
                    ext: "mp4".into(),
                    height: Some(720),
                    vcodec: Some("avc1".into()),
                    ..Default::default()
                }],
            })
            .then_ok("b.mp4");
        let events = Recorder::default();
        let requests = vec![
            video("https://example-unknown.test/x", QualityHint::Interactive),
            video("https://youtu.be/b", QualityHint::Interactive),
        ];
        let mut prompt = Counting { asked: 0 };

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&requests, Some(&mut prompt))
            .await;

        assert_eq!(tally, BatchTally { total: 2, succeeded: 1 });
        assert_eq!(*engine.probes.lock().unwrap(), vec!["https://youtu.be/b".to_string()]);
        let (url, fetch) = engine.last_fetch().unwrap();
        assert_eq!(url, "https://youtu.be/b");
        assert_eq!(
            fetch.format.unwrap().as_str(),
            "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
        );
    }

    #[tokio::test]
    async fn batch_of_unsupported_urls_never_probes() {
        let env = env();
        let engine = FakeEngine::new();
        let events = Recorder::default();
        let requests = vec![
            video("https://example-unknown.test/x", QualityHint::Interactive),
            video("https://example-unknown.test/y", QualityHint::Interactive),
        ];
        let mut prompt = Counting { asked: 0 };

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&requests, Some(&mut prompt))
            .await;

        assert_eq!(tally, BatchTally { total: 2, succeeded: 0 });
        assert_eq!(prompt.asked, 0);
        assert_eq!(engine.probe_count(), 0);
        assert_eq!(engine.fetch_count(), 0);
    }

    #[tokio::test]
    async fn audio_batch_never_prompts() {
        let env = env();
        let engine = FakeEngine::new().then_ok("a.webm").then_ok("b.webm");
        let events = Recorder::default();
        let requests = vec![
            DownloadRequest::new(
                "https://soundcloud.com/a/b",
                MediaKind::Audio,
                QualityHint::Interactive,
            ),
            DownloadRequest::new("https://youtu.be/x", MediaKind::Audio, QualityHint::Interactive),
        ];
        let mut prompt = Counting { asked: 0 };

        let tally = BatchRunner::new(ctx(&env, &engine, &events))
            .run(&requests, Some(&mut prompt))
            .await;

        assert_eq!(tally.succeeded, 2);
        assert_eq!(prompt.asked, 0);
        assert_eq!(engine.probe_count(), 0);
    }
}
