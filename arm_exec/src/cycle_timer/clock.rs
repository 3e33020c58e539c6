//! Monotonic clock abstraction used by the cycle timer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of monotonic time which can also block the calling thread.
///
/// Times are measured from an arbitrary, fixed origin chosen by the clock.
pub trait MonotonicClock {
    /// Current time since the clock's origin.
    fn now(&self) -> Result<Duration, ClockError>;

    /// Block for the given duration. Implementations must not return early.
    fn sleep(&mut self, duration: Duration);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Clock backed by `std::time::Instant` and `std::thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors reading a monotonic clock.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("The clock reading went backwards past its origin")]
    BeforeOrigin,

    #[error("The clock could not be read: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StdClock {
    /// Create a new clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for StdClock {
    fn now(&self) -> Result<Duration, ClockError> {
        Instant::now()
            .checked_duration_since(self.origin)
            .ok_or(ClockError::BeforeOrigin)
    }

    fn sleep(&mut self, duration: Duration) {
        // std already resumes sleeping after a signal interrupts it
        thread::sleep(duration)
    }
}
