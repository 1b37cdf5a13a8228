//! The auto-advance timer: one optional deadline, a fixed delay after
//! content has been shown.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct AutoAdvance {
    delay: Duration,
    deadline: Option<Instant>,
}

impl AutoAdvance {
    pub fn new(delay: Duration) -> AutoAdvance {
        AutoAdvance {
            delay: delay,
            deadline: None,
        }
    }

    /// Schedules the timer to fire `delay` after `now`, replacing any
    /// earlier schedule.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns whether the deadline has passed, disarming the timer if so.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
