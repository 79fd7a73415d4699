//! Simulated time for the counter
//!
//! The simulation advances in discrete one-minute ticks. Nothing in the
//! engine reads wall-clock time; every timestamp is a minute index.

use serde::{Deserialize, Serialize};

/// Monotonic minute counter driving the simulation
///
/// # Example
/// ```
/// use barista_simulator_core_rs::TimeManager;
///
/// let mut time = TimeManager::new();
/// assert_eq!(time.current_minute(), 0);
///
/// time.advance_minute();
/// assert_eq!(time.current_minute(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeManager {
    /// Minutes elapsed since the simulation started (or was last reset)
    current_minute: u32,
}

impl TimeManager {
    /// Create a clock positioned at minute zero
    pub fn new() -> Self {
        Self { current_minute: 0 }
    }

    /// Create a clock positioned at an arbitrary minute (checkpoint restore)
    pub fn at_minute(minute: u32) -> Self {
        Self {
            current_minute: minute,
        }
    }

    /// Advance time by one minute
    pub fn advance_minute(&mut self) {
        self.current_minute += 1;
    }

    /// Current simulated minute
    pub fn current_minute(&self) -> u32 {
        self.current_minute
    }

    /// Minutes elapsed since `minute`, saturating at zero for future stamps
    ///
    /// # Example
    /// ```
    /// use barista_simulator_core_rs::TimeManager;
    ///
    /// let time = TimeManager::at_minute(7);
    /// assert_eq!(time.minutes_since(3), 4);
    /// assert_eq!(time.minutes_since(9), 0);
    /// ```
    pub fn minutes_since(&self, minute: u32) -> u32 {
        self.current_minute.saturating_sub(minute)
    }

    /// Return to minute zero
    pub fn reset(&mut self) {
        self.current_minute = 0;
    }
}
