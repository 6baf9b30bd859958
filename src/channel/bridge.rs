//! Moving values between channels and proxies.
//!
//! Proxies are pull-driven and single-threaded; channels connect them to
//! other tasks. A producer can read a source, a consumer can write a sink,
//! and either can be spawned onto its own task behind a fresh channel.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::channel::config::ChannelConfig;
use crate::channel::sink::{ChannelSink, Sink};
use crate::channel::source::{ChannelSource, Source};
use crate::cancel::CancelToken;
use crate::channel::channel;
use crate::effect::from_async;
use crate::error::Error;
use crate::proxy::{self, Consumer, Producer, Proxy};

/// A producer that emits every value of `source` and finishes when the
/// source ends. A source failure becomes an effect failure.
///
/// ```rust
/// use millrace::channel::{bridge, source};
/// use millrace::proxy::{self, Closed};
///
/// # tokio_test::block_on(async {
/// let pipeline: Closed<Vec<&str>> = proxy::to_vec(bridge::producer_from(source::from_iter(["a", "b"])));
/// assert_eq!(proxy::run(pipeline, &()).await, Ok(vec!["a", "b"]));
/// # });
/// ```
pub fn producer_from<S, E, Env>(source: S) -> Producer<S::Item, (), E, Env>
where
    S: Source + 'static,
    S::Item: 'static,
    E: From<Error> + Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let next = proxy::lift(from_async(move |_: &Env| {
        let mut source = source;
        async move {
            let item = source.read().await.map_err(E::from)?;
            Ok::<_, E>((source, item))
        }
    }));
    next.and_then(|(source, item)| match item {
        Some(value) => proxy::yielding(value).and_then(move |()| producer_from(source)),
        None => Proxy::Pure(()),
    })
}

/// A consumer that posts every value it receives to `sink`. It never
/// finishes by itself; a failed post fails the pipeline.
pub fn consumer_into<K, R, E, Env>(sink: K) -> Consumer<K::Item, R, E, Env>
where
    K: Sink + 'static,
    K::Item: 'static,
    R: Send + 'static,
    E: From<Error> + Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let sink = Arc::new(sink);
    proxy::repeat(move || {
        let sink = sink.clone();
        proxy::awaiting().and_then(move |value| {
            proxy::lift(from_async(move |_: &Env| async move {
                sink.post(value).await.map_err(E::from)
            }))
        })
    })
}

/// Run `producer` on a new task, feeding a new channel, and return the
/// channel's reading end.
///
/// The channel completes when the producer finishes and fails with the
/// producer's error if it fails. Dropping every reader closes the channel,
/// which stops the task at its next post.
///
/// Must be called from within a tokio runtime.
pub fn spawn_producer<A, E, Env>(
    producer: Producer<A, (), E, Env>,
    env: Env,
    config: ChannelConfig,
) -> ChannelSource<A>
where
    A: Send + 'static,
    E: From<Error> + Into<Error> + Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let (sink, source) = channel(config);
    let feed = consumer_into(sink.clone());
    tokio::spawn(async move {
        match proxy::run(producer.pipe(feed), &env).await {
            Ok(()) => sink.complete(),
            Err(error) => sink.fail(error.into()),
        }
    });
    source
}

/// Like [`spawn_producer`], but the task stops when `token` is cancelled.
///
/// A cancelled run fails the channel with [`Error::Cancelled`], so readers
/// can tell an interrupted stream from a finished one.
pub fn spawn_producer_until_cancelled<A, E, Env>(
    producer: Producer<A, (), E, Env>,
    env: Env,
    config: ChannelConfig,
    token: CancelToken,
) -> ChannelSource<A>
where
    A: Send + 'static,
    E: From<Error> + Into<Error> + Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let (sink, source) = channel(config);
    let feed = consumer_into(sink.clone());
    tokio::spawn(async move {
        match proxy::run_until_cancelled(producer.pipe(feed), &env, &token).await {
            Ok(()) => sink.complete(),
            Err(interrupted) => {
                let error = Error::from(interrupted);
                tracing::debug!(%error, "spawned producer stopped");
                sink.fail(error);
            }
        }
    });
    source
}

/// Run `consumer` on a new task, reading from a new channel, and return
/// the channel's writing end with the task's handle.
///
/// The consumer sees the end of its input when the channel completes
/// (explicitly, or because every sink handle was dropped).
///
/// Must be called from within a tokio runtime.
pub fn spawn_consumer<A, E, Env>(
    consumer: Consumer<A, (), E, Env>,
    env: Env,
    config: ChannelConfig,
) -> (ChannelSink<A>, JoinHandle<Result<(), E>>)
where
    A: Send + 'static,
    E: From<Error> + Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    let (sink, source) = channel(config);
    let pipeline = producer_from(source).pipe(consumer);
    let handle = tokio::spawn(async move { proxy::run(pipeline, &env).await });
    (sink, handle)
}
