//! Buffered channels and the [`Sink`] / [`Source`] abstractions over them.
//!
//! A channel is a shared buffer with a lifecycle (see [`Status`]). Writers
//! post through a [`ChannelSink`], readers read through a
//! [`ChannelSource`]; both handles are `Clone`, so a channel can have
//! many writers and many competing readers. Backpressure comes from the
//! [`ChannelConfig`]: bounded channels make writers wait, fail, or evict
//! the oldest value when full.
//!
//! Values buffered before a channel completes or fails are still read;
//! only after the buffer drains do readers see the end (`Ok(None)`) or the
//! failure.
//!
//! ```rust
//! use millrace::channel::{channel, ChannelConfig, Sink, Source};
//!
//! # tokio_test::block_on(async {
//! let (sink, mut source) = channel(ChannelConfig::bounded(8));
//!
//! let writer = tokio::spawn(async move {
//!     for n in 0..3 {
//!         sink.post(n).await.unwrap();
//!     }
//!     sink.complete();
//! });
//!
//! let mut seen = Vec::new();
//! while let Some(n) = source.read().await.unwrap() {
//!     seen.push(n);
//! }
//! writer.await.unwrap();
//! assert_eq!(seen, vec![0, 1, 2]);
//! # });
//! ```
//!
//! The [`bridge`] module connects channels to [`proxy`](crate::proxy)
//! pipelines.

use std::sync::Arc;

pub mod bridge;
mod buffer;
mod conduit;
mod config;
mod sink;
pub mod source;

pub use buffer::Status;
pub use conduit::Conduit;
pub use config::{Capacity, ChannelConfig, Overflow};
pub use sink::{
    empty_sink, void_sink, BoxedSink, ChannelSink, Combine, Comap, EmptySink, Route, Sink,
    SinkExt, SinkGuard, VoidSink,
};
pub use source::{
    AndThen, BoxedSource, Chain, ChannelSource, Choose, Empty, Failed, Iter, Map, Merge, Once,
    Source, SourceExt,
};

use buffer::Shared;

/// Create a channel and return its writing and reading ends.
pub fn channel<A: Send>(config: ChannelConfig) -> (ChannelSink<A>, ChannelSource<A>) {
    let shared = Arc::new(Shared::new(config));
    tracing::trace!(?config, "channel created");
    (ChannelSink::new(shared.clone()), ChannelSource::new(shared))
}
