//! Time sources for throttling and decay
//!
//! Perception, decision re-evaluation and memory decay compare timestamps
//! (seconds, f64) read from a `Clock`. The default `WallClock` reads real
//! monotonic time, so apparent reaction latency depends on frame rate.
//! `ManualClock` advances only when the world ticks.

use std::time::Instant;

/// Monotonic time source in seconds
pub trait Clock {
    /// Current time in seconds since the clock started
    fn now(&self) -> f64;

    /// Called once per tick with the tick's `dt`. Wall clocks ignore it.
    fn advance(&mut self, dt: f64);
}

/// Real monotonic time
#[derive(Debug, Clone)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn advance(&mut self, _dt: f64) {}
}

/// Simulated time, advanced by the tick `dt`
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: f64) -> Self {
        Self { now }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.now += dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let mut clock = ManualClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert!((clock.now() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_manual_clock_ignores_bad_dt() {
        let mut clock = ManualClock::starting_at(10.0);
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn test_wall_clock_monotonic() {
        let clock = WallClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
