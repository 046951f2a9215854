//! # Logical Clock
//!
//! Monotonic counter that stamps every delivered message. Time advances only
//! when the drain loop delivers a message, never from wall-clock observation.

use crate::domain::value_objects::LogicalTime;

/// Default distance between two consecutive deliveries.
pub const LT_STEP: u64 = 1_000_000;

/// Logical clock owned by a single simulator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalClock {
    now: LogicalTime,
    step: u64,
}

impl LogicalClock {
    /// Creates a clock at zero advancing by `step`.
    ///
    /// A zero step is bumped to one so consecutive stamps stay distinct.
    #[must_use]
    pub fn new(step: u64) -> Self {
        Self {
            now: LogicalTime::ZERO,
            step: step.max(1),
        }
    }

    /// Current value, i.e. the stamp of the last delivery.
    #[must_use]
    pub fn now(&self) -> LogicalTime {
        self.now
    }

    /// The fixed step.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Moves the clock forward by one step and returns the new value.
    ///
    /// Returns `None` and leaves the clock untouched once another step would
    /// overflow; a stamp is never handed out twice.
    pub fn advance(&mut self) -> Option<LogicalTime> {
        let next = self.now.0.checked_add(self.step)?;
        self.now = LogicalTime(next);
        Some(self.now)
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new(LT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(LogicalClock::default().now(), LogicalTime::ZERO);
    }

    #[test]
    fn test_advance_by_step() {
        let mut clock = LogicalClock::default();
        assert_eq!(clock.advance(), Some(LogicalTime(LT_STEP)));
        assert_eq!(clock.advance(), Some(LogicalTime(2 * LT_STEP)));
        assert_eq!(clock.now(), LogicalTime(2 * LT_STEP));
    }

    #[test]
    fn test_zero_step_bumped() {
        let mut clock = LogicalClock::new(0);
        assert_eq!(clock.step(), 1);
        let a = clock.advance();
        let b = clock.advance();
        assert!(a < b);
    }

    #[test]
    fn test_overflow_stops_the_clock() {
        let mut clock = LogicalClock::new(u64::MAX / 2 + 1);
        assert_eq!(clock.advance(), Some(LogicalTime(u64::MAX / 2 + 1)));
        assert_eq!(clock.advance(), None);
        assert_eq!(clock.advance(), None);
        assert_eq!(clock.now(), LogicalTime(u64::MAX / 2 + 1));
    }
}
