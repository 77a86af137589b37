use std::time::Duration;

use tokio::time::Instant;

pub const MIN_CYCLE_INTERVAL: Duration = Duration::from_secs(3);

/// Single-slot timer for the auto-advance. Arming always replaces the
/// previous deadline, so at most one fire is ever pending.
#[derive(Debug, Clone)]
pub struct RotationScheduler {
    interval: Duration,
    pending: Option<Instant>,
}

impl RotationScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_CYCLE_INTERVAL),
            pending: None,
        }
    }

    /// Effective interval after the lower bound is applied.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancels whatever is pending, then arms a fresh deadline unless paused.
    pub fn schedule(&mut self, now: Instant, paused: bool) -> Option<Instant> {
        self.cancel();
        if paused {
            return None;
        }
        let due = now + self.interval;
        self.pending = Some(due);
        Some(due)
    }

    /// Safe to call with nothing pending. Returns whether a deadline was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the deadline if it has passed. A wake-up for a deadline that
    /// was cancelled or re-armed later returns false.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(due) if due <= now => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_floored() {
        assert_eq!(RotationScheduler::new(Duration::from_secs(1)).interval(), MIN_CYCLE_INTERVAL);
        assert_eq!(
            RotationScheduler::new(Duration::from_secs(10)).interval(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn rescheduling_replaces_deadline() {
        let t0 = Instant::now();
        let mut r = RotationScheduler::new(Duration::from_secs(5));
        r.schedule(t0, false);
        let later = r.schedule(t0 + Duration::from_secs(2), false).unwrap();
        assert_eq!(r.deadline(), Some(later));
        assert!(!r.take_due(t0 + Duration::from_secs(5)));
        assert!(r.take_due(t0 + Duration::from_secs(7)));
        assert!(!r.is_pending());
    }

    #[test]
    fn paused_schedule_leaves_nothing_pending() {
        let t0 = Instant::now();
        let mut r = RotationScheduler::new(Duration::from_secs(5));
        r.schedule(t0, false);
        assert_eq!(r.schedule(t0, true), None);
        assert!(!r.is_pending());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut r = RotationScheduler::new(Duration::from_secs(5));
        assert!(!r.cancel());
        r.schedule(Instant::now(), false);
        assert!(r.cancel());
        assert!(!r.cancel());
    }

    #[test]
    fn fires_once_per_arm() {
        let t0 = Instant::now();
        let mut r = RotationScheduler::new(Duration::from_secs(3));
        r.schedule(t0, false);
        let late = t0 + Duration::from_secs(60);
        assert!(r.take_due(late));
        assert!(!r.take_due(late));
    }
}
