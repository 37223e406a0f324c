use tokio::sync::watch;

use crate::models::media::ProgressSample;

pub type ProgressReceiver = watch::Receiver<Option<ProgressSample>>;

/// Single-slot progress mailbox for one in-flight download.
///
/// The engine writes samples through [`ProgressTracker::on_sample`]; readers
/// either query the tracker directly or poll a [`ProgressReceiver`] obtained
/// from [`ProgressTracker::subscribe`]. Only the latest sample is kept.
#[derive(Debug)]
pub struct ProgressTracker {
    slot: watch::Sender<Option<ProgressSample>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    pub fn on_sample(&self, sample: ProgressSample) {
        self.slot.send_replace(Some(sample));
    }

    pub fn latest(&self) -> Option<ProgressSample> {
        *self.slot.borrow()
    }

    pub fn current_percent(&self) -> Option<f64> {
        self.latest().and_then(percent_of)
    }

    pub fn subscribe(&self) -> ProgressReceiver {
        self.slot.subscribe()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimated totals can briefly trail the downloaded count, hence the clamp.
pub fn percent_of(sample: ProgressSample) -> Option<f64> {
    let total = sample.total_bytes.filter(|t| *t > 0)?;
    let pct = sample.downloaded_bytes as f64 / total as f64 * 100.0;
    Some(pct.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(downloaded: u64, total: Option<u64>) -> ProgressSample {
        ProgressSample {
            downloaded_bytes: downloaded,
            total_bytes: total,
        }
    }

    #[test]
    fn no_sample_is_unknown() {
        assert_eq!(ProgressTracker::new().current_percent(), None);
    }

    #[test]
    fn unknown_total_is_unknown() {
        let tracker = ProgressTracker::new();
        tracker.on_sample(sample(500, None));
        assert_eq!(tracker.current_percent(), None);
    }

    #[test]
    fn zero_total_is_unknown() {
        assert_eq!(percent_of(sample(10, Some(0))), None);
    }

    #[test]
    fn half_way() {
        let tracker = ProgressTracker::new();
        tracker.on_sample(sample(50, Some(100)));
        assert_eq!(tracker.current_percent(), Some(50.0));
    }

    #[test]
    fn overshoot_is_clamped() {
        let tracker = ProgressTracker::new();
        tracker.on_sample(sample(1_200, Some(1_000)));
        assert_eq!(tracker.current_percent(), Some(100.0));
    }

    #[test]
    fn only_latest_sample_is_kept() {
        let tracker = ProgressTracker::new();
        tracker.on_sample(sample(10, Some(100)));
        tracker.on_sample(sample(90, Some(100)));
        assert_eq!(tracker.latest(), Some(sample(90, Some(100))));
        assert_eq!(tracker.current_percent(), Some(90.0));
    }

    #[tokio::test]
    async fn subscriber_sees_updates() {
        let tracker = ProgressTracker::new();
        let mut rx = tracker.subscribe();
        tracker.on_sample(sample(1, Some(4)));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().and_then(percent_of), Some(25.0));
    }

    #[tokio::test]
    async fn subscriber_ends_when_tracker_dropped() {
        let tracker = ProgressTracker::new();
        let mut rx = tracker.subscribe();
        drop(tracker);
        assert!(rx.changed().await.is_err());
    }
}
