//! Millisecond clocks driving the frame loop

use std::thread;
use std::time::{Duration, Instant};

/// Monotonic millisecond time source
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Wall clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that reads zero at creation and can be stopped.
///
/// While paused the reading is frozen; on resume it continues from the frozen
/// value, so paused time never counts and the reading never goes backwards.
#[derive(Debug)]
pub struct PausableClock<C> {
    source: C,
    origin: u64,
    paused_total: u64,
    paused_at: Option<u64>,
}

impl<C: Clock> PausableClock<C> {
    pub fn new(source: C) -> Self {
        let origin = source.now_ms();
        Self {
            source,
            origin,
            paused_total: 0,
            paused_at: None,
        }
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.source.now_ms());
        }
    }

    pub fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += self.source.now_ms().saturating_sub(at);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Total time spent paused, including a pause in progress
    pub fn paused_ms(&self) -> u64 {
        match self.paused_at {
            Some(at) => self.paused_total + self.source.now_ms().saturating_sub(at),
            None => self.paused_total,
        }
    }
}

impl<C: Clock> Clock for PausableClock<C> {
    fn now_ms(&self) -> u64 {
        let raw = self.paused_at.unwrap_or_else(|| self.source.now_ms());
        raw.saturating_sub(self.origin)
            .saturating_sub(self.paused_total)
    }
}

/// Result of the startup timer check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockCheck {
    /// First reading, should be close to zero
    pub first_ms: u64,
    /// Measured length of the nap
    pub delta_ms: u64,
    pub expected_ms: u64,
}

impl ClockCheck {
    /// Within 10% of the nap (and at least 5 ms) counts as healthy
    pub fn is_plausible(&self) -> bool {
        let slack = (self.expected_ms / 10).max(5);
        self.delta_ms + slack >= self.expected_ms && self.delta_ms <= self.expected_ms + slack
    }
}

/// Read the clock, sleep, read again, and log both values.
pub fn self_test<C: Clock>(clock: &C, nap: Duration) -> ClockCheck {
    let first_ms = clock.now_ms();
    log::info!("clock ms0 (should be ~0): {}", first_ms);
    thread::sleep(nap);
    let delta_ms = clock.now_ms().saturating_sub(first_ms);
    let check = ClockCheck {
        first_ms,
        delta_ms,
        expected_ms: nap.as_millis() as u64,
    };
    if check.is_plausible() {
        log::info!("clock delta (should be ~{}): {}", check.expected_ms, delta_ms);
    } else {
        log::warn!("clock delta {} ms after a {} ms sleep, pacing will drift", delta_ms, check.expected_ms);
    }
    check
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Hand-driven clock for deterministic tests
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now: Cell<u64>,
    }

    impl ManualClock {
        pub fn new(start: u64) -> Self {
            Self { now: Cell::new(start) }
        }

        pub fn set(&self, ms: u64) {
            self.now.set(ms);
        }

        pub fn advance(&self, ms: u64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }

    #[test]
    fn test_pausable_starts_at_zero() {
        let source = ManualClock::new(5_000);
        let clock = PausableClock::new(&source);
        assert_eq!(clock.now_ms(), 0);
        source.advance(40);
        assert_eq!(clock.now_ms(), 40);
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let source = ManualClock::new(0);
        let mut clock = PausableClock::new(&source);
        source.set(100);
        clock.pause();
        assert!(clock.is_paused());
        source.set(10_100);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.paused_ms(), 10_000);

        clock.resume();
        assert!(!clock.is_paused());
        assert_eq!(clock.now_ms(), 100);
        source.advance(33);
        assert_eq!(clock.now_ms(), 133);
    }

    #[test]
    fn test_repeated_pause_and_resume_are_idempotent() {
        let source = ManualClock::new(0);
        let mut clock = PausableClock::new(&source);
        source.set(10);
        clock.pause();
        source.set(20);
        clock.pause();
        source.set(30);
        clock.resume();
        clock.resume();
        assert_eq!(clock.now_ms(), 10);
        assert_eq!(clock.paused_ms(), 20);
    }

    #[test]
    fn test_clock_check_plausibility() {
        let ok = ClockCheck { first_ms: 0, delta_ms: 1_004, expected_ms: 1_000 };
        assert!(ok.is_plausible());
        let slow = ClockCheck { first_ms: 0, delta_ms: 1_500, expected_ms: 1_000 };
        assert!(!slow.is_plausible());
        let stuck = ClockCheck { first_ms: 0, delta_ms: 0, expected_ms: 1_000 };
        assert!(!stuck.is_plausible());
    }

    #[test]
    fn test_self_test_measures_sleep() {
        let check = self_test(&SystemClock::new(), Duration::from_millis(20));
        assert!(check.delta_ms >= 20);
    }
}
