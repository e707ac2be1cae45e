//! Debounced re-evaluation scheduling.
//!
//! One pending deadline at most. Every qualifying mutation re-arms it, so
//! evaluation only runs after the document has been quiet for the whole
//! period. The scheduler never looks at a clock itself; the host passes
//! `Instant`s in, which keeps tests off the wall clock.

use std::time::{Duration, Instant};

use tracing::trace;

/// How long the document must stay quiet before a cycle fires.
pub const QUIET_PERIOD: Duration = Duration::from_millis(800);

#[derive(Debug)]
pub struct EvalScheduler {
    deadline: Option<Instant>,
    quiet: Duration,
}

impl EvalScheduler {
    pub fn new() -> Self {
        Self::with_quiet_period(QUIET_PERIOD)
    }

    pub fn with_quiet_period(quiet: Duration) -> Self {
        Self {
            deadline: None,
            quiet,
        }
    }

    /// Arm, or push back, the single pending deadline.
    pub fn note_mutation(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
        trace!("re-evaluation deadline re-armed");
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Disarm and report whether a cycle should run now.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

impl Default for EvalScheduler {
    fn default() -> Self {
        Self::new()
    }
}
