//! The stage clock: elapsed-time checks against a stage anchor.
//!
//! Everything here works on monotonic `tokio::time::Instant`s, so the same
//! arithmetic runs against real time in the shell and against paused, virtual
//! time in tests.

use std::time::Duration;
use tokio::time::Instant;

/// A wake-up emitted by the `ActivityPump`.
///
/// It carries no work of its own; it only tells the driving loop to
/// re-evaluate the stage thresholds.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Sequence number of this tick since the pump started.
    pub tick_count: u64,
    /// When the pump produced the tick.
    pub timestamp: Instant,
}

/// Time passed from `anchor` to `now`. Zero if `now` is earlier.
pub fn elapsed(anchor: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(anchor)
}

/// Whether at least `threshold` has passed from `anchor` to `now`.
pub fn has_elapsed(anchor: Instant, now: Instant, threshold: Duration) -> bool {
    elapsed(anchor, now) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_measures_forward_time() {
        let anchor = Instant::now();
        let now = anchor + Duration::from_millis(1250);
        assert_eq!(elapsed(anchor, now), Duration::from_millis(1250));
    }

    #[test]
    fn elapsed_saturates_when_now_is_behind_anchor() {
        let now = Instant::now();
        let anchor = now + Duration::from_millis(10);
        assert_eq!(elapsed(anchor, now), Duration::ZERO);
    }

    #[test]
    fn threshold_is_inclusive() {
        let anchor = Instant::now();
        let threshold = Duration::from_millis(400);
        assert!(!has_elapsed(anchor, anchor + Duration::from_millis(399), threshold));
        assert!(has_elapsed(anchor, anchor + threshold, threshold));
        assert!(has_elapsed(anchor, anchor + Duration::from_millis(401), threshold));
    }

    #[test]
    fn zero_threshold_has_always_elapsed() {
        let anchor = Instant::now();
        assert!(has_elapsed(anchor, anchor, Duration::ZERO));
    }
}
