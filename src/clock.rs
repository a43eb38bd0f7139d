//! Monotonic time source used for file headers and log timestamps.

use std::time::Instant;

/// Source of monotonic seconds
pub trait Clock: Send + Sync {
    /// Seconds elapsed since an arbitrary fixed origin
    fn monotonic(&self) -> f64;
}

/// Clock backed by [`Instant`], starting at zero when created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn monotonic(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that always reports the same instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn monotonic(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        let t = clock.monotonic();
        assert!(t >= 0.0);
        assert!(t < 5.0);
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.monotonic();
        let b = clock.monotonic();
        assert!(b >= a);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(12.5).monotonic(), 12.5);
    }
}
