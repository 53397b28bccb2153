//! Repeating timers with explicit cancellation tokens.
//!
//! [`ManualScheduler`] keeps a virtual clock that the host advances (from a
//! real-time loop in the shell, or step by step in tests). Fired timers are
//! handed out one at a time so a handler that cancels a timer takes effect
//! before the next firing is considered.

use std::time::Duration;

/// Handle of a scheduled repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// Fires every `interval` until cancelled.
    fn schedule_repeating(&mut self, interval: Duration) -> TimerToken;

    /// Returns whether `token` was still scheduled.
    fn cancel(&mut self, token: TimerToken) -> bool;

    fn is_scheduled(&self, token: TimerToken) -> bool;
}

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
struct Timer {
    token: TimerToken,
    interval: Duration,
    next_due: Duration,
}

#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    deadline: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Moves the deadline forward; drain firings with [`Self::next_fired`].
    pub fn advance_by(&mut self, elapsed: Duration) {
        self.deadline = self.deadline.max(self.now) + elapsed;
    }

    /// Pops the earliest timer due at or before the deadline.
    ///
    /// Ties fire in scheduling order. When nothing is due the clock catches up
    /// with the deadline and `None` is returned.
    pub fn next_fired(&mut self) -> Option<TimerToken> {
        let deadline = self.deadline;
        let due = self
            .timers
            .iter_mut()
            .filter(|t| t.next_due <= deadline)
            .min_by_key(|t| (t.next_due, t.token));

        match due {
            Some(timer) => {
                self.now = timer.next_due;
                timer.next_due += timer.interval;
                Some(timer.token)
            }
            None => {
                self.now = self.now.max(deadline);
                None
            }
        }
    }

    /// Advances by `elapsed` and collects every firing in order.
    ///
    /// Only suitable when handlers do not cancel timers mid-batch; otherwise
    /// use [`Self::advance_by`] + [`Self::next_fired`].
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerToken> {
        self.advance_by(elapsed);
        std::iter::from_fn(|| self.next_fired()).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&mut self, interval: Duration) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;
        let interval = interval.max(MIN_INTERVAL);
        self.timers.push(Timer {
            token,
            interval,
            next_due: self.now + interval,
        });
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.token != token);
        self.timers.len() != before
    }

    fn is_scheduled(&self, token: TimerToken) -> bool {
        self.timers.iter().any(|t| t.token == token)
    }
}
