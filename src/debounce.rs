//! A cancellable debounce deadline, held as a value instead of a timer
//! task. The host loop owns time: it restarts the deadline on activity
//! and polls `fire` whenever its clock advances.

use std::time::Duration;
use std::time::Instant;

/// Coalesces a burst of activity into one deadline.
#[derive(Clone, Debug)]
pub struct Debounce {
    delay: Duration,
    fire_at: Option<Instant>,
}

impl Debounce {
    /// A disarmed debounce with the given delay.
    pub fn new(delay: Duration) -> Debounce {
        return Debounce {
            delay,
            fire_at: None,
        };
    }

    /// Arm the deadline at `now + delay`, superseding any earlier one.
    pub fn restart(&mut self, now: Instant) {
        self.fire_at = Some(now + self.delay);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.fire_at = None;
    }

    /// Whether a deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        return self.fire_at.is_some();
    }

    /// True exactly once when the armed deadline has been reached;
    /// firing disarms.
    pub fn fire(&mut self, now: Instant) -> bool {
        return match self.fire_at {
            Some(at) if now >= at => {
                self.fire_at = None;
                true
            }
            _ => false,
        };
    }
}
