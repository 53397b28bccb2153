//! Debounced user-facing notices.
//!
//! Rejected parameter values surface as notices rather than errors; bursts
//! of them (a held key, a batch of command-line assignments) collapse into
//! one visible notice per window plus a count of the swallowed ones.

use std::time::Duration;

use crate::error::InvalidParameterError;

/// Minimum spacing between two visible notices.
pub const NOTICE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Notices swallowed by the debounce window since the last visible one.
    pub suppressed: u32,
}

/// Rate limiter for transient advisory messages.
///
/// Time is passed in by the caller (monotonic offset from any fixed origin),
/// which keeps the window testable against a virtual clock.
#[derive(Debug, Clone)]
pub struct NoticeDebouncer {
    window: Duration,
    last_shown: Option<Duration>,
    suppressed: u32,
}

impl Default for NoticeDebouncer {
    fn default() -> Self {
        Self::new(NOTICE_DEBOUNCE)
    }
}

impl NoticeDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_shown: None,
            suppressed: 0,
        }
    }

    /// Returns the notice to show, or `None` while inside the window.
    pub fn offer(
        &mut self,
        now: Duration,
        level: NoticeLevel,
        message: impl Into<String>,
    ) -> Option<Notice> {
        if let Some(last) = self.last_shown {
            if now.saturating_sub(last) <= self.window {
                self.suppressed = self.suppressed.saturating_add(1);
                return None;
            }
        }
        self.last_shown = Some(now);
        Some(Notice {
            level,
            message: message.into(),
            suppressed: std::mem::take(&mut self.suppressed),
        })
    }

    /// Notices swallowed since the last visible one.
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }

    pub fn offer_error(&mut self, now: Duration, err: &InvalidParameterError) -> Option<Notice> {
        self.offer(now, NoticeLevel::Error, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn at_most_one_notice_per_window() {
        let mut d = NoticeDebouncer::default();
        assert!(d.offer(ms(0), NoticeLevel::Error, "a").is_some());
        assert!(d.offer(ms(100), NoticeLevel::Error, "b").is_none());
        assert!(d.offer(ms(500), NoticeLevel::Error, "c").is_none());
        assert_eq!(d.suppressed(), 2);

        let n = d.offer(ms(501), NoticeLevel::Error, "d").unwrap();
        assert_eq!(n.message, "d");
        assert_eq!(n.suppressed, 2);

        assert_eq!(d.suppressed(), 0);
        let n = d.offer(ms(2000), NoticeLevel::Info, "e").unwrap();
        assert_eq!(n.suppressed, 0);
    }

    #[test]
    fn parameter_errors_render_their_message() {
        let mut d = NoticeDebouncer::default();
        let err = InvalidParameterError::new("p", "must lie in (0, 1)");
        let n = d.offer_error(ms(10), &err).unwrap();
        assert_eq!(n.level, NoticeLevel::Error);
        assert!(n.message.contains("`p`"));
    }
}
