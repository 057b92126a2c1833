//! The dirty window: a grace period protecting fresh local edits.
//!
//! The backend echoes every push back to its subscribers, and other
//! clients push their own versions of the list. A snapshot applied while
//! the user is mid-edit would revert keystrokes that have not been pushed
//! yet, so after any local mutation incoming snapshots are discarded
//! outright until a deadline passes. Within the window the local session
//! wins unconditionally; losing a remote edit for a few hundred
//! milliseconds is the accepted cost.

use std::time::Duration;
use std::time::Instant;

/// Suppression window for incoming snapshots after a local edit.
///
/// Every local mutation pushes the deadline out to `now + grace`. Time is
/// always passed in by the caller, so sessions can be driven forward
/// deterministically without waiting on a wall clock.
#[derive(Clone, Debug)]
pub struct DirtyWindow {
    grace: Duration,
    deadline: Option<Instant>,
}

impl DirtyWindow {
    /// A window with the given grace period, initially clean.
    pub fn new(grace: Duration) -> DirtyWindow {
        return DirtyWindow {
            grace,
            deadline: None,
        };
    }

    /// Record a local edit at `now`, extending suppression to
    /// `now + grace`.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.deadline = Some(now + self.grace);
    }

    /// Whether a snapshot arriving at `now` must be discarded. True
    /// strictly before the deadline.
    pub fn is_suppressed(&self, now: Instant) -> bool {
        return match self.deadline {
            Some(deadline) => now < deadline,
            None => false,
        };
    }

    /// Forget any pending suppression, as when switching lists.
    pub fn reset(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_millis(700);

    #[test]
    fn a_fresh_window_suppresses_nothing() {
        let window = DirtyWindow::new(GRACE);
        assert!(!window.is_suppressed(Instant::now()));
    }

    #[test]
    fn suppression_covers_the_grace_period_exclusively() {
        let t0 = Instant::now();
        let mut window = DirtyWindow::new(GRACE);
        window.mark_dirty(t0);
        assert!(window.is_suppressed(t0));
        assert!(window.is_suppressed(t0 + GRACE / 2));
        assert!(!window.is_suppressed(t0 + GRACE));
        assert!(!window.is_suppressed(t0 + GRACE * 2));
    }

    #[test]
    fn repeated_edits_extend_the_deadline() {
        let t0 = Instant::now();
        let mut window = DirtyWindow::new(GRACE);
        window.mark_dirty(t0);
        window.mark_dirty(t0 + GRACE / 2);
        assert!(window.is_suppressed(t0 + GRACE));
        assert!(!window.is_suppressed(t0 + GRACE / 2 + GRACE));
    }

    #[test]
    fn reset_forgets_the_deadline() {
        let t0 = Instant::now();
        let mut window = DirtyWindow::new(GRACE);
        window.mark_dirty(t0);
        window.reset();
        assert!(!window.is_suppressed(t0));
    }
}
