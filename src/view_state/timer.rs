//! Cancellable periodic timer driven by explicit instants.
//!
//! The timer never reads the clock itself; the frame loop passes `now` in. This
//! keeps pagination deterministic under test.

use std::time::{Duration, Instant};

/// Periodic pagination timer.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use transcript_layout::view_state::timer::PaginationTimer;
///
/// let start = Instant::now();
/// let mut timer = PaginationTimer::default();
/// timer.start(start, Duration::from_millis(100));
///
/// assert!(!timer.poll(start + Duration::from_millis(50)));
/// // Two intervals elapsed, but missed ticks are not replayed.
/// assert!(timer.poll(start + Duration::from_millis(250)));
/// assert!(!timer.poll(start + Duration::from_millis(290)));
/// assert!(timer.poll(start + Duration::from_millis(300)));
///
/// timer.cancel();
/// assert!(!timer.poll(start + Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaginationTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl PaginationTimer {
    /// (Re)start ticking every `interval`, first tick one interval after `now`.
    ///
    /// A zero interval fires once per poll.
    pub fn start(&mut self, now: Instant, interval: Duration) {
        self.interval = interval;
        self.next_due = Some(now + interval);
    }

    /// Stop ticking. Ticks that were due but not yet polled are discarded.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// True between `start` and `cancel`.
    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True if a tick fell due by `now`.
    ///
    /// At most one tick is reported per poll. Deadlines missed while nobody
    /// polled are skipped and the next one is the first on the original phase
    /// that lies after `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(mut due) = self.next_due else {
            return false;
        };
        if self.interval.is_zero() {
            self.next_due = Some(now);
            return true;
        }
        if due > now {
            return false;
        }
        while due <= now {
            due += self.interval;
        }
        self.next_due = Some(due);
        true
    }
}
