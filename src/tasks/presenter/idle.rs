use std::time::Duration;

use tokio::time::Instant;

pub const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    None,
    /// Idle just started. `pause` is set when rotation was running and must
    /// be paused on our behalf.
    Enter { pause: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionOutcome {
    /// The idle overlay was showing and should be hidden.
    pub left_idle: bool,
    /// Rotation was paused by idle (not by the user) and should resume.
    pub resume: bool,
}

/// Screensaver trigger. Polled on a fixed cadence; disabled entirely when the
/// timeout is zero.
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    timeout: Option<Duration>,
    last_interaction: Instant,
    active: bool,
    paused_by_idle: bool,
    next_poll: Option<Instant>,
}

impl IdleMonitor {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        Self {
            timeout,
            last_interaction: now,
            active: false,
            paused_by_idle: false,
            next_poll: timeout.map(|_| now + IDLE_POLL_INTERVAL),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timeout.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn paused_by_idle(&self) -> bool {
        self.paused_by_idle
    }

    pub fn next_poll(&self) -> Option<Instant> {
        self.next_poll
    }

    pub fn stop(&mut self) {
        self.next_poll = None;
    }

    /// One poll tick. Re-arms the next poll while enabled.
    pub fn poll(&mut self, now: Instant, paused: bool) -> IdleAction {
        let Some(timeout) = self.timeout else {
            return IdleAction::None;
        };
        if self.next_poll.is_none() {
            return IdleAction::None;
        }
        self.next_poll = Some(now + IDLE_POLL_INTERVAL);

        if self.active || now.duration_since(self.last_interaction) < timeout {
            return IdleAction::None;
        }
        self.active = true;
        // A pause the user already asked for is not ours to undo later.
        self.paused_by_idle = !paused;
        IdleAction::Enter { pause: !paused }
    }

    pub fn mark_interaction(&mut self, now: Instant, paused: bool) -> InteractionOutcome {
        self.last_interaction = now;
        let left_idle = std::mem::take(&mut self.active);
        let resume = std::mem::take(&mut self.paused_by_idle) && paused;
        InteractionOutcome { left_idle, resume }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn zero_timeout_disables_polling() {
        let t0 = Instant::now();
        let mut idle = IdleMonitor::new(Duration::ZERO, t0);
        assert!(!idle.is_enabled());
        assert_eq!(idle.next_poll(), None);
        assert_eq!(idle.poll(t0 + secs(3600), false), IdleAction::None);
    }

    #[test]
    fn enters_once_after_timeout() {
        let t0 = Instant::now();
        let mut idle = IdleMonitor::new(secs(5), t0);
        assert_eq!(idle.poll(t0 + secs(4), false), IdleAction::None);
        assert_eq!(idle.poll(t0 + secs(5), false), IdleAction::Enter { pause: true });
        assert!(idle.is_active());
        assert!(idle.paused_by_idle());
        assert_eq!(idle.poll(t0 + secs(6), true), IdleAction::None);
        assert_eq!(idle.poll(t0 + secs(60), true), IdleAction::None);
    }

    #[test]
    fn interaction_resumes_only_idle_pause() {
        let t0 = Instant::now();
        let mut idle = IdleMonitor::new(secs(5), t0);
        idle.poll(t0 + secs(5), false);
        let out = idle.mark_interaction(t0 + secs(6), true);
        assert_eq!(out, InteractionOutcome { left_idle: true, resume: true });
        assert!(!idle.is_active());
    }

    #[test]
    fn user_pause_survives_idle() {
        let t0 = Instant::now();
        let mut idle = IdleMonitor::new(secs(5), t0);
        assert_eq!(idle.poll(t0 + secs(5), true), IdleAction::Enter { pause: false });
        assert!(!idle.paused_by_idle());
        let out = idle.mark_interaction(t0 + secs(6), true);
        assert_eq!(out, InteractionOutcome { left_idle: true, resume: false });
    }

    #[test]
    fn interaction_restarts_countdown() {
        let t0 = Instant::now();
        let mut idle = IdleMonitor::new(secs(5), t0);
        idle.mark_interaction(t0 + secs(4), false);
        assert_eq!(idle.poll(t0 + secs(8), false), IdleAction::None);
        assert_eq!(idle.poll(t0 + secs(9), false), IdleAction::Enter { pause: true });
    }

    #[test]
    fn poll_rearms_and_stop_disarms() {
        let t0 = Instant::now();
        let mut idle = IdleMonitor::new(secs(5), t0);
        assert_eq!(idle.next_poll(), Some(t0 + IDLE_POLL_INTERVAL));
        idle.poll(t0 + secs(1), false);
        assert_eq!(idle.next_poll(), Some(t0 + secs(2)));
        idle.stop();
        assert_eq!(idle.poll(t0 + secs(30), false), IdleAction::None);
        assert_eq!(idle.next_poll(), None);
    }
}
