/// Trailing-edge debouncer for update notifications.
///
/// Each change re-arms a quiet-period deadline; the update fires once changes
/// stop for that long. A continuous stream cannot postpone it forever: the
/// deadline never moves past `max_wait` after the first change of a burst.
///
/// Time is passed in by the caller, so the worker loop can wait on
/// [`deadline`](Debouncer::deadline) and tests need no sleeps.
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    max_wait: Duration,
    burst_start: Option<Instant>,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// `max_wait` shorter than `quiet` is raised to `quiet`.
    pub fn new(quiet: Duration, max_wait: Duration) -> Self {
        Self {
            quiet,
            max_wait: max_wait.max(quiet),
            burst_start: None,
            deadline: None,
        }
    }

    /// Record a change at `now`.
    pub fn arm(&mut self, now: Instant) {
        let start = *self.burst_start.get_or_insert(now);
        self.deadline = Some((now + self.quiet).min(start + self.max_wait));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `true` (and disarmed) when the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Drop any pending update.
    pub fn cancel(&mut self) {
        self.burst_start = None;
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}
