//! Errors produced by schedule-driven combinators.

use std::time::Duration;

/// Every attempt allowed by the schedule failed.
///
/// ```rust
/// use millrace::effect::prelude::*;
/// use millrace::effect::retry;
/// use millrace::Schedule;
///
/// # tokio_test::block_on(async {
/// let effect = retry(|| fail::<(), _, ()>("down"), Schedule::recurs(2));
/// let exhausted = effect.run(&()).await.unwrap_err();
/// assert_eq!(exhausted.final_error, "down");
/// assert_eq!(exhausted.attempts, 3);
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// The error of the last attempt.
    pub final_error: E,
    /// Total attempts, the first one included.
    pub attempts: u32,
    /// Time from the first attempt to giving up.
    pub total_duration: Duration,
}

impl<E> RetryExhausted<E> {
    /// Build the error.
    pub fn new(final_error: E, attempts: u32, total_duration: Duration) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
        }
    }

    /// Drop the metadata.
    pub fn into_error(self) -> E {
        self.final_error
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gave up after {} attempts ({:?}): {}",
            self.attempts, self.total_duration, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}

/// An effect either timed out or failed on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// The deadline passed first.
    Timeout {
        /// The deadline that was exceeded.
        duration: Duration,
    },
    /// The effect failed before the deadline.
    Inner(E),
}

impl<E> TimeoutError<E> {
    /// True for [`TimeoutError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The inner error, if the effect failed by itself.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { duration } => write!(f, "timed out after {:?}", duration),
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn exhausted_display_mentions_attempts() {
        let err = RetryExhausted::new("refused", 4, Duration::from_millis(30));
        let text = err.to_string();
        assert!(text.contains("4 attempts"));
        assert!(text.contains("refused"));
        assert_eq!(err.into_error(), "refused");
    }

    #[test]
    fn timeout_variants() {
        let t: TimeoutError<&str> = TimeoutError::Timeout {
            duration: Duration::from_secs(1),
        };
        assert!(t.is_timeout());
        assert_eq!(t.into_inner(), None);
        assert_eq!(TimeoutError::Inner("x").into_inner(), Some("x"));
    }
}
