//! # Millrace
//!
//! Effectful streaming pipelines with bidirectional flow, and backpressured
//! channels to connect them.
//!
//! ## The pieces
//!
//! - [`proxy`]: the [`Proxy`] algebra. A proxy talks to an upstream and a
//!   downstream neighbour; producers, consumers, pipes, clients and servers
//!   are all proxies with some ports closed. Composition joins them into
//!   closed pipelines, which run as an [`Effect`].
//! - [`effect`]: the effect contract the algebra is generic over. Effects
//!   are lazy values that run against an environment and can fail.
//! - [`channel`]: buffered channels, [`Sink`](channel::Sink) and
//!   [`Source`](channel::Source), and bridges to proxies.
//! - [`Schedule`]: delay sequences driving repetition, windowed folds and
//!   retries.
//!
//! ## Quick example
//!
//! ```rust
//! use millrace::proxy::{self, fold, Closed, Producer};
//!
//! # tokio_test::block_on(async {
//! let readings: Producer<u32> = proxy::each([3, 4, 5, 1, 9, 2]);
//!
//! // Group readings into batches whose sum reaches 8.
//! let batches = readings.pipe(fold::fold_until(
//!     |sum: u32, x: &u32| sum + x,
//!     |sum: &u32, _: &u32| *sum >= 8,
//!     0,
//! ));
//! let pipeline: Closed<Vec<u32>> = proxy::to_vec(batches);
//!
//! assert_eq!(proxy::run(pipeline, &()).await, Ok(vec![12, 10]));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cancel;
pub mod channel;
pub mod effect;
pub mod either;
pub mod error;
pub mod proxy;
pub mod schedule;
pub mod semigroup;

// Re-exports
pub use cancel::{CancelToken, Interrupted};
pub use effect::{Effect, EffectExt};
pub use either::Either;
pub use error::{Error, ErrorKind};
pub use proxy::{Client, Closed, Consumer, Pipe, Producer, Proxy, Server, Void};
pub use schedule::Schedule;
pub use semigroup::Semigroup;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancel::{CancelToken, Interrupted};
    pub use crate::channel::{channel, ChannelConfig, Sink, SinkExt, Source, SourceExt};
    pub use crate::effect::prelude::*;
    pub use crate::either::Either;
    pub use crate::error::{Error, ErrorKind};
    pub use crate::proxy::{Client, Closed, Consumer, Pipe, Producer, Proxy, Server, Void};
    pub use crate::schedule::Schedule;
    pub use crate::semigroup::Semigroup;
}
