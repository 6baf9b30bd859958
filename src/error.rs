//! The channel-layer error type.
//!
//! Channel operations fail with [`Error`]. The type supports the two
//! things fan-out and recovery need: aggregating independent causes into
//! one value ([`Semigroup`]) and asking "is this (or any cause) a closed /
//! full / … error" ([`Error::is`]).
//!
//! ```
//! use millrace::{Error, ErrorKind, Semigroup};
//!
//! let err = Error::Closed.combine(Error::message("disk quota"));
//! assert_eq!(err.kind(), ErrorKind::Many);
//! assert!(err.is(ErrorKind::Closed));
//! assert!(err.is(ErrorKind::Message));
//! assert!(!err.is(ErrorKind::Full));
//! assert_eq!(err.causes().len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::Interrupted;
use crate::schedule::TimeoutError;
use crate::semigroup::Semigroup;

/// A channel-state or user error.
#[derive(Debug, Clone)]
pub enum Error {
    /// Posting to a completed channel, or to an empty sink.
    Closed,
    /// Posting to a full bounded channel configured to fail writers.
    Full,
    /// The surrounding run was cancelled. Converted from
    /// [`Interrupted::Cancelled`].
    Cancelled,
    /// A deadline passed. Converted from [`TimeoutError::Timeout`].
    Timeout(Duration),
    /// A user error described by a message.
    Message(String),
    /// A user error carried as a boxed error value.
    Custom(Arc<dyn std::error::Error + Send + Sync>),
    /// Several independent failures.
    Many(Vec<Error>),
}

/// The class of an [`Error`], for selective recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`Error::Closed`]
    Closed,
    /// [`Error::Full`]
    Full,
    /// [`Error::Cancelled`]
    Cancelled,
    /// [`Error::Timeout`]
    Timeout,
    /// [`Error::Message`]
    Message,
    /// [`Error::Custom`]
    Custom,
    /// [`Error::Many`]
    Many,
}

impl Error {
    /// A user error from a message.
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Message(msg.into())
    }

    /// A user error from any error value.
    pub fn custom<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Custom(Arc::new(error))
    }

    /// The class of this error. Aggregates report [`ErrorKind::Many`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Closed => ErrorKind::Closed,
            Error::Full => ErrorKind::Full,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Message(_) => ErrorKind::Message,
            Error::Custom(_) => ErrorKind::Custom,
            Error::Many(_) => ErrorKind::Many,
        }
    }

    /// True if this error, or any aggregated cause, has class `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
            || match self {
                Error::Many(causes) => causes.iter().any(|cause| cause.is(kind)),
                _ => false,
            }
    }

    /// The individual failures: the aggregated causes, or `self` alone.
    pub fn causes(&self) -> &[Error] {
        match self {
            Error::Many(causes) => causes,
            single => std::slice::from_ref(single),
        }
    }
}

impl Semigroup for Error {
    /// Flattens: combining aggregates never nests `Many` inside `Many`.
    fn combine(self, other: Self) -> Self {
        let mut causes = match self {
            Error::Many(causes) => causes,
            single => vec![single],
        };
        match other {
            Error::Many(more) => causes.extend(more),
            single => causes.push(single),
        }
        Error::Many(causes)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Closed, Error::Closed)
            | (Error::Full, Error::Full)
            | (Error::Cancelled, Error::Cancelled) => true,
            (Error::Timeout(a), Error::Timeout(b)) => a == b,
            (Error::Message(a), Error::Message(b)) => a == b,
            (Error::Custom(a), Error::Custom(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            (Error::Many(a), Error::Many(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Closed => write!(f, "channel is closed"),
            Error::Full => write!(f, "channel buffer is full"),
            Error::Cancelled => write!(f, "cancelled"),
            Error::Timeout(d) => write!(f, "timed out after {:?}", d),
            Error::Message(msg) => write!(f, "{}", msg),
            Error::Custom(e) => write!(f, "{}", e),
            Error::Many(causes) => {
                write!(f, "{} errors:", causes.len())?;
                for cause in causes {
                    write!(f, "\n  - {}", cause)?;
                }
                Ok(())
            }
        }
    }
}

impl<E: Into<Error>> From<Interrupted<E>> for Error {
    fn from(interrupted: Interrupted<E>) -> Self {
        match interrupted {
            Interrupted::Cancelled => Error::Cancelled,
            Interrupted::Failed(error) => error.into(),
        }
    }
}

impl<E: Into<Error>> From<TimeoutError<E>> for Error {
    fn from(timeout: TimeoutError<E>) -> Self {
        match timeout {
            TimeoutError::Timeout { duration } => Error::Timeout(duration),
            TimeoutError::Inner(error) => error.into(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Custom(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
