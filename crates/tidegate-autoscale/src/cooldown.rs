//! Cooldown gate.
//!
//! A single timer shared by both directions: any successful scale closes
//! the gate for `window`, whether the next move would be up or down.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: Duration,
    last_scale: Option<Instant>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_scale: None,
        }
    }

    /// `true` once at least `window` has elapsed since the last scale.
    pub fn allow(&self, now: Instant) -> bool {
        match self.last_scale {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.window,
        }
    }

    /// Time left before `allow` turns true.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_scale {
            None => Duration::ZERO,
            Some(at) => self
                .window
                .saturating_sub(now.saturating_duration_since(at)),
        }
    }

    /// Mark a successful scale at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_scale = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_before_first_scale() {
        let gate = CooldownGate::new(Duration::from_secs(60));
        let now = Instant::now();
        assert!(gate.allow(now));
        assert_eq!(gate.remaining(now), Duration::ZERO);
    }

    #[test]
    fn closed_inside_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(60));
        let t0 = Instant::now();
        gate.record(t0);

        assert!(!gate.allow(t0 + Duration::from_secs(1)));
        assert_eq!(
            gate.remaining(t0 + Duration::from_secs(1)),
            Duration::from_secs(59)
        );
    }

    #[test]
    fn opens_exactly_at_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(60));
        let t0 = Instant::now();
        gate.record(t0);

        assert!(!gate.allow(t0 + Duration::from_millis(59_999)));
        assert!(gate.allow(t0 + Duration::from_secs(60)));
        assert_eq!(gate.remaining(t0 + Duration::from_secs(90)), Duration::ZERO);
    }

    #[test]
    fn zero_window_never_blocks() {
        let mut gate = CooldownGate::new(Duration::ZERO);
        let t0 = Instant::now();
        gate.record(t0);
        assert!(gate.allow(t0));
    }

    #[test]
    fn clock_before_last_scale_stays_closed() {
        let mut gate = CooldownGate::new(Duration::from_secs(10));
        let t0 = Instant::now();
        gate.record(t0 + Duration::from_secs(5));
        assert!(!gate.allow(t0));
    }
}
