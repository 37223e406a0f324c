use crate::core::progress::ProgressReceiver;
use crate::models::media::{BatchTally, DownloadOutcome};

/// Hooks for the presentation layer. Every method has a default so a
/// collaborator only implements what it renders.
pub trait DownloadEvents: Send + Sync {
    /// The engine is about to run; `progress` yields samples until the
    /// download ends.
    fn engaged(&self, _url: &str, _progress: ProgressReceiver) {}

    fn finished(&self, url: &str, outcome: &DownloadOutcome) {
        match (&outcome.final_path, &outcome.error_message) {
            (Some(path), _) => tracing::info!("Download complete: {}", path.display()),
            (None, Some(err)) => tracing::error!("Download failed for {}: {}", url, err),
            (None, None) => tracing::error!("Download failed for {}", url),
        }
    }

    fn item_started(&self, index: usize, total: usize, url: &str) {
        tracing::info!("Processing URL {} of {}: {}", index, total, url);
    }

    fn batch_finished(&self, tally: &BatchTally) {
        tracing::info!(
            "Batch download complete: {}/{} succeeded",
            tally.succeeded,
            tally.total
        );
    }
}
