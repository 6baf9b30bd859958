//! The writing side: the [`Sink`] trait, channel sinks and sink combinators.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::channel::buffer::{Offer, Shared, Status};
use crate::effect::parallel::join_combined;
use crate::effect::BoxFuture;
use crate::either::Either;
use crate::error::Error;

/// Something values can be posted to.
///
/// A sink is shared by reference (`&self`), so many tasks can post to the
/// same sink. `complete` and `fail` end the sink: after `complete` every
/// post fails with [`Error::Closed`], after `fail(e)` every post fails with
/// `e`. Both are idempotent and the first one wins.
///
/// # Example
///
/// ```rust
/// use millrace::channel::{channel, ChannelConfig, Sink, SinkExt, Source};
///
/// # tokio_test::block_on(async {
/// let (sink, mut source) = channel::<String>(ChannelConfig::unbounded());
/// let lengths = sink.clone().comap(|n: usize| "x".repeat(n));
///
/// lengths.post(3).await.unwrap();
/// sink.complete();
///
/// assert_eq!(source.read().await, Ok(Some("xxx".to_string())));
/// assert_eq!(source.read().await, Ok(None));
/// # });
/// ```
pub trait Sink: Send + Sync {
    /// What the sink accepts.
    type Item: Send;

    /// Post one value, waiting if the sink applies backpressure.
    fn post(&self, value: Self::Item) -> impl Future<Output = Result<(), Error>> + Send;

    /// End the sink normally.
    fn complete(&self);

    /// End the sink with an error that readers will observe.
    fn fail(&self, error: Error);
}

/// The writing handle of a channel. Clones share the channel.
///
/// When the last sink handle is dropped the channel completes.
pub struct ChannelSink<A> {
    shared: Arc<Shared<A>>,
}

impl<A> ChannelSink<A> {
    pub(crate) fn new(shared: Arc<Shared<A>>) -> Self {
        ChannelSink { shared }
    }

    /// Post without waiting. A full channel under [`Overflow::Block`]
    /// reports [`Error::Full`] instead of waiting.
    ///
    /// [`Overflow::Block`]: crate::channel::Overflow::Block
    pub fn try_post(&self, value: A) -> Result<(), Error> {
        match self.shared.offer(value) {
            Offer::Accepted => Ok(()),
            Offer::Rejected(error) => Err(error),
            Offer::Blocked(_) => Err(Error::Full),
        }
    }

    /// A guard that completes the channel when it is dropped, even while
    /// other sink handles are alive.
    pub fn guard(&self) -> SinkGuard<A> {
        SinkGuard { sink: self.clone() }
    }

    /// The channel's lifecycle state.
    pub fn status(&self) -> Status {
        self.shared.status()
    }

    /// True once the channel is completed or failed.
    pub fn is_closed(&self) -> bool {
        self.shared.status().is_terminal()
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A> Clone for ChannelSink<A> {
    fn clone(&self) -> Self {
        self.shared.add_writer();
        ChannelSink {
            shared: self.shared.clone(),
        }
    }
}

impl<A> Drop for ChannelSink<A> {
    fn drop(&mut self) {
        self.shared.drop_writer();
    }
}

impl<A> fmt::Debug for ChannelSink<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSink")
            .field("config", self.shared.config())
            .field("status", &self.shared.status())
            .field("len", &self.shared.len())
            .finish()
    }
}

impl<A: Send> Sink for ChannelSink<A> {
    type Item = A;

    fn post(&self, value: A) -> impl Future<Output = Result<(), Error>> + Send {
        self.shared.post(value)
    }

    fn complete(&self) {
        self.shared.complete();
    }

    fn fail(&self, error: Error) {
        self.shared.fail(error);
    }
}

/// Completes its channel on drop. Created by [`ChannelSink::guard`].
///
/// Hand one to whatever owns the writing work: if that work is cancelled
/// or unwinds, dropping the guard tells readers the stream is over.
#[derive(Debug)]
pub struct SinkGuard<A> {
    sink: ChannelSink<A>,
}

impl<A> SinkGuard<A> {
    /// The guarded sink.
    pub fn sink(&self) -> &ChannelSink<A> {
        &self.sink
    }
}

impl<A> Drop for SinkGuard<A> {
    fn drop(&mut self) {
        self.sink.shared.complete();
    }
}

/// Posts `f(value)` to the inner sink. Created by [`SinkExt::comap`].
pub struct Comap<S, F, B> {
    inner: S,
    f: F,
    _item: PhantomData<fn(B)>,
}

impl<S, F, B> fmt::Debug for Comap<S, F, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comap")
            .field("inner", &"<sink>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<S, F, B> Sink for Comap<S, F, B>
where
    S: Sink,
    F: Fn(B) -> S::Item + Send + Sync,
    B: Send,
{
    type Item = B;

    fn post(&self, value: B) -> impl Future<Output = Result<(), Error>> + Send {
        self.inner.post((self.f)(value))
    }

    fn complete(&self) {
        self.inner.complete();
    }

    fn fail(&self, error: Error) {
        self.inner.fail(error);
    }
}

/// Splits each value and posts both halves concurrently. Created by
/// [`SinkExt::combine`].
///
/// A post waits for both sides. If either side fails the post fails; if
/// both fail their errors are aggregated.
pub struct Combine<L, R, F, A> {
    left: L,
    right: R,
    split: F,
    _item: PhantomData<fn(A)>,
}

impl<L, R, F, A> fmt::Debug for Combine<L, R, F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combine")
            .field("left", &"<sink>")
            .field("right", &"<sink>")
            .field("split", &"<function>")
            .finish()
    }
}

impl<L, R, F, A> Sink for Combine<L, R, F, A>
where
    L: Sink,
    R: Sink,
    F: Fn(A) -> (L::Item, R::Item) + Send + Sync,
    A: Send,
{
    type Item = A;

    async fn post(&self, value: A) -> Result<(), Error> {
        let (left, right) = (self.split)(value);
        join_combined(self.left.post(left), self.right.post(right))
            .await
            .map(|((), ())| ())
            .inspect_err(|error| {
                if error.causes().len() > 1 {
                    tracing::debug!(causes = error.causes().len(), "both sides of combined sink failed");
                }
            })
    }

    fn complete(&self) {
        self.left.complete();
        self.right.complete();
    }

    fn fail(&self, error: Error) {
        self.left.fail(error.clone());
        self.right.fail(error);
    }
}

/// Sends each value to exactly one side. Created by [`SinkExt::route`].
pub struct Route<L, R, F, A> {
    left: L,
    right: R,
    choose: F,
    _item: PhantomData<fn(A)>,
}

impl<L, R, F, A> fmt::Debug for Route<L, R, F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("left", &"<sink>")
            .field("right", &"<sink>")
            .field("choose", &"<function>")
            .finish()
    }
}

impl<L, R, F, A> Sink for Route<L, R, F, A>
where
    L: Sink,
    R: Sink,
    F: Fn(A) -> Either<L::Item, R::Item> + Send + Sync,
    A: Send,
{
    type Item = A;

    async fn post(&self, value: A) -> Result<(), Error> {
        match (self.choose)(value) {
            Either::Left(left) => self.left.post(left).await,
            Either::Right(right) => self.right.post(right).await,
        }
    }

    fn complete(&self) {
        self.left.complete();
        self.right.complete();
    }

    fn fail(&self, error: Error) {
        self.left.fail(error.clone());
        self.right.fail(error);
    }
}

/// A sink that is always closed. See [`empty_sink`].
#[derive(Debug)]
pub struct EmptySink<A> {
    _item: PhantomData<fn(A)>,
}

/// A sink whose every post fails with [`Error::Closed`].
pub fn empty_sink<A: Send>() -> EmptySink<A> {
    EmptySink { _item: PhantomData }
}

impl<A: Send> Sink for EmptySink<A> {
    type Item = A;

    async fn post(&self, _value: A) -> Result<(), Error> {
        Err(Error::Closed)
    }

    fn complete(&self) {}

    fn fail(&self, _error: Error) {}
}

/// A sink that accepts and discards everything. See [`void_sink`].
#[derive(Debug)]
pub struct VoidSink<A> {
    _item: PhantomData<fn(A)>,
}

/// A sink whose every post succeeds and discards the value.
pub fn void_sink<A: Send>() -> VoidSink<A> {
    VoidSink { _item: PhantomData }
}

impl<A: Send> Sink for VoidSink<A> {
    type Item = A;

    async fn post(&self, _value: A) -> Result<(), Error> {
        Ok(())
    }

    fn complete(&self) {}

    fn fail(&self, _error: Error) {}
}

trait DynSink<A>: Send + Sync {
    fn post_boxed(&self, value: A) -> BoxFuture<'_, Result<(), Error>>;
    fn complete_dyn(&self);
    fn fail_dyn(&self, error: Error);
}

impl<S: Sink> DynSink<S::Item> for S {
    fn post_boxed(&self, value: S::Item) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(self.post(value))
    }

    fn complete_dyn(&self) {
        self.complete();
    }

    fn fail_dyn(&self, error: Error) {
        self.fail(error);
    }
}

/// A type-erased, clonable sink. Created by [`SinkExt::boxed`].
pub struct BoxedSink<A> {
    inner: Arc<dyn DynSink<A>>,
}

impl<A> Clone for BoxedSink<A> {
    fn clone(&self) -> Self {
        BoxedSink {
            inner: self.inner.clone(),
        }
    }
}

impl<A> fmt::Debug for BoxedSink<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSink").field("inner", &"<sink>").finish()
    }
}

impl<A: Send + 'static> Sink for BoxedSink<A> {
    type Item = A;

    fn post(&self, value: A) -> impl Future<Output = Result<(), Error>> + Send {
        self.inner.post_boxed(value)
    }

    fn complete(&self) {
        self.inner.complete_dyn();
    }

    fn fail(&self, error: Error) {
        self.inner.fail_dyn(error);
    }
}

/// Combinators available on every [`Sink`].
pub trait SinkExt: Sink + Sized {
    /// Adapt the sink to accept `B`, converting with `f` before posting.
    fn comap<B, F>(self, f: F) -> Comap<Self, F, B>
    where
        F: Fn(B) -> Self::Item + Send + Sync,
        B: Send,
    {
        Comap {
            inner: self,
            f,
            _item: PhantomData,
        }
    }

    /// Fan out: split each value and post both halves concurrently.
    ///
    /// ```rust
    /// use millrace::channel::{channel, empty_sink, ChannelConfig, Sink, SinkExt, Source};
    /// use millrace::ErrorKind;
    ///
    /// # tokio_test::block_on(async {
    /// let (names, mut read_names) = channel::<String>(ChannelConfig::unbounded());
    /// let both = names
    ///     .clone()
    ///     .combine(empty_sink::<u32>(), |person: (String, u32)| person);
    ///
    /// // The channel side still receives its half when the other side fails.
    /// let err = both.post(("ada".to_string(), 36)).await.unwrap_err();
    /// assert!(err.is(ErrorKind::Closed));
    /// assert_eq!(read_names.try_read(), Ok(Some("ada".to_string())));
    /// # });
    /// ```
    fn combine<R, F, A>(self, other: R, split: F) -> Combine<Self, R, F, A>
    where
        R: Sink,
        F: Fn(A) -> (Self::Item, R::Item) + Send + Sync,
        A: Send,
    {
        Combine {
            left: self,
            right: other,
            split,
            _item: PhantomData,
        }
    }

    /// Route each value to this sink (`Left`) or `other` (`Right`).
    fn route<R, F, A>(self, other: R, choose: F) -> Route<Self, R, F, A>
    where
        R: Sink,
        F: Fn(A) -> Either<Self::Item, R::Item> + Send + Sync,
        A: Send,
    {
        Route {
            left: self,
            right: other,
            choose,
            _item: PhantomData,
        }
    }

    /// Erase the sink's type.
    fn boxed(self) -> BoxedSink<Self::Item>
    where
        Self: 'static,
    {
        BoxedSink {
            inner: Arc::new(self),
        }
    }
}

impl<S: Sink> SinkExt for S {}
