//! Schedules: timing and termination for repeat, retry and windowed folds.
//!
//! A [`Schedule`] is pure data describing a sequence of delays. Consumers
//! sleep for each delay in turn and stop when the sequence ends:
//!
//! - `proxy::repeat_with` re-runs a sub-pipeline once per delay
//! - `proxy::fold` emits its accumulator whenever a window elapses
//! - `effect::retry` retries a failing effect once per delay
//!
//! ```rust
//! use millrace::Schedule;
//! use std::time::Duration;
//!
//! let backoff = Schedule::exponential(Duration::from_millis(50))
//!     .with_max_delay(Duration::from_secs(1))
//!     .take(8);
//! assert!(backoff.is_finite());
//! ```
//!
//! Jitter needs the `jitter` feature; without it jitter settings are inert.

mod error;
mod policy;

pub use error::{RetryExhausted, TimeoutError};
pub use policy::{Delays, Jitter, Schedule, Strategy};
