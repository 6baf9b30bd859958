//! The reading side: the [`Source`] trait, channel sources, constructors and
//! source combinators.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::channel::buffer::{Shared, Status};
use crate::effect::BoxFuture;
use crate::error::Error;
use crate::semigroup::Semigroup;

/// Something values can be read from, one at a time.
///
/// `Ok(Some(v))` is the next value, `Ok(None)` the end of the stream and
/// `Err(e)` a failure. Every source in this module has cancel-safe reads:
/// dropping a pending `read` future never loses a value, which is what
/// lets [`Merge`] race two reads.
///
/// # Example
///
/// ```rust
/// use millrace::channel::{source, SourceExt};
///
/// # tokio_test::block_on(async {
/// let doubled = source::from_iter(vec![1, 2, 3]).map(|x| x * 2);
/// assert_eq!(doubled.collect().await, Ok(vec![2, 4, 6]));
/// # });
/// ```
pub trait Source: Send {
    /// What the source yields.
    type Item: Send;

    /// Read the next value.
    fn read(&mut self) -> impl Future<Output = Result<Option<Self::Item>, Error>> + Send;
}

/// The reading handle of a channel. Clones share the channel and compete
/// for its values: each value is read by exactly one handle.
///
/// When the last source handle is dropped the channel closes and further
/// posts fail with [`Error::Closed`].
pub struct ChannelSource<A> {
    shared: Arc<Shared<A>>,
}

impl<A> ChannelSource<A> {
    pub(crate) fn new(shared: Arc<Shared<A>>) -> Self {
        ChannelSource { shared }
    }

    /// Read without waiting.
    ///
    /// `Ok(None)` means nothing is buffered right now. A finished channel
    /// with nothing left reports [`Error::Closed`] (completed) or its
    /// failure.
    pub fn try_read(&self) -> Result<Option<A>, Error> {
        match self.shared.take() {
            Some(Ok(None)) => Err(Error::Closed),
            Some(outcome) => outcome,
            None => Ok(None),
        }
    }

    /// The channel's lifecycle state.
    pub fn status(&self) -> Status {
        self.shared.status()
    }

    /// True once the channel is completed or failed. Buffered values may
    /// still be readable.
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

impl<A> Clone for ChannelSource<A> {
    fn clone(&self) -> Self {
        self.shared.add_reader();
        ChannelSource {
            shared: self.shared.clone(),
        }
    }
}

impl<A> Drop for ChannelSource<A> {
    fn drop(&mut self) {
        self.shared.drop_reader();
    }
}

impl<A> fmt::Debug for ChannelSource<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSource")
            .field("config", self.shared.config())
            .field("status", &self.shared.status())
            .field("len", &self.shared.len())
            .finish()
    }
}

impl<A: Send> Source for ChannelSource<A> {
    type Item = A;

    fn read(&mut self) -> impl Future<Output = Result<Option<A>, Error>> + Send {
        self.shared.read()
    }
}

/// Yields one value, then ends. See [`pure`].
#[derive(Debug, Clone)]
pub struct Once<A> {
    value: Option<A>,
}

/// A source of exactly one value.
pub fn pure<A: Send>(value: A) -> Once<A> {
    Once { value: Some(value) }
}

impl<A: Send> Source for Once<A> {
    type Item = A;

    async fn read(&mut self) -> Result<Option<A>, Error> {
        Ok(self.value.take())
    }
}

/// A source that has already ended. See [`empty`].
#[derive(Debug, Clone)]
pub struct Empty<A> {
    _item: std::marker::PhantomData<fn() -> A>,
}

/// A source with no values.
pub fn empty<A: Send>() -> Empty<A> {
    Empty {
        _item: std::marker::PhantomData,
    }
}

impl<A: Send> Source for Empty<A> {
    type Item = A;

    async fn read(&mut self) -> Result<Option<A>, Error> {
        Ok(None)
    }
}

/// Yields the items of an iterator. See [`from_iter`].
#[derive(Debug, Clone)]
pub struct Iter<I> {
    items: I,
}

/// A source yielding every item of `items`, then ending.
pub fn from_iter<I>(items: I) -> Iter<I::IntoIter>
where
    I: IntoIterator,
    I::IntoIter: Send,
    I::Item: Send,
{
    Iter {
        items: items.into_iter(),
    }
}

impl<I> Source for Iter<I>
where
    I: Iterator + Send,
    I::Item: Send,
{
    type Item = I::Item;

    async fn read(&mut self) -> Result<Option<I::Item>, Error> {
        Ok(self.items.next())
    }
}

/// A source that fails every read. See [`failed`].
#[derive(Debug, Clone)]
pub struct Failed<A> {
    error: Error,
    _item: std::marker::PhantomData<fn() -> A>,
}

/// A source whose every read fails with `error`.
pub fn failed<A: Send>(error: Error) -> Failed<A> {
    Failed {
        error,
        _item: std::marker::PhantomData,
    }
}

impl<A: Send> Source for Failed<A> {
    type Item = A;

    async fn read(&mut self) -> Result<Option<A>, Error> {
        Err(self.error.clone())
    }
}

/// Transforms each value. Created by [`SourceExt::map`].
pub struct Map<S, F> {
    inner: S,
    f: F,
}

impl<S, F> fmt::Debug for Map<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("inner", &"<source>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<S, F, B> Source for Map<S, F>
where
    S: Source,
    F: FnMut(S::Item) -> B + Send,
    B: Send,
{
    type Item = B;

    async fn read(&mut self) -> Result<Option<B>, Error> {
        Ok(self.inner.read().await?.map(&mut self.f))
    }
}

/// Reads every value of the source built from each outer value. Created
/// by [`SourceExt::and_then`].
pub struct AndThen<S, F, T> {
    outer: S,
    f: F,
    current: Option<T>,
}

impl<S, F, T> fmt::Debug for AndThen<S, F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndThen")
            .field("outer", &"<source>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<S, F, T> Source for AndThen<S, F, T>
where
    S: Source,
    T: Source,
    F: FnMut(S::Item) -> T + Send,
{
    type Item = T::Item;

    async fn read(&mut self) -> Result<Option<T::Item>, Error> {
        loop {
            if let Some(inner) = self.current.as_mut() {
                match inner.read().await? {
                    Some(value) => return Ok(Some(value)),
                    None => self.current = None,
                }
            }
            match self.outer.read().await? {
                Some(value) => self.current = Some((self.f)(value)),
                None => return Ok(None),
            }
        }
    }
}

/// Everything from the first source, then everything from the second.
/// Created by [`SourceExt::chain`].
#[derive(Debug)]
pub struct Chain<L, R> {
    left: L,
    right: R,
    left_done: bool,
}

impl<L, R> Source for Chain<L, R>
where
    L: Source,
    R: Source<Item = L::Item>,
{
    type Item = L::Item;

    async fn read(&mut self) -> Result<Option<L::Item>, Error> {
        if !self.left_done {
            match self.left.read().await? {
                Some(value) => return Ok(Some(value)),
                None => self.left_done = true,
            }
        }
        self.right.read().await
    }
}

/// Interleaves two sources in arrival order. Created by
/// [`SourceExt::merge`].
///
/// Each side's own order is preserved. The merge ends once both sides
/// have ended; a failure on either side is returned as soon as it is read.
#[derive(Debug)]
pub struct Merge<L, R> {
    left: L,
    right: R,
    left_done: bool,
    right_done: bool,
}

enum Side {
    Left,
    Right,
}

impl<L, R> Source for Merge<L, R>
where
    L: Source,
    R: Source<Item = L::Item>,
{
    type Item = L::Item;

    async fn read(&mut self) -> Result<Option<L::Item>, Error> {
        loop {
            let (side, outcome) = match (self.left_done, self.right_done) {
                (true, true) => return Ok(None),
                (false, true) => (Side::Left, self.left.read().await),
                (true, false) => (Side::Right, self.right.read().await),
                // Unbiased select polls the sides in random order.
                (false, false) => tokio::select! {
                    outcome = self.left.read() => (Side::Left, outcome),
                    outcome = self.right.read() => (Side::Right, outcome),
                },
            };
            match outcome? {
                Some(value) => return Ok(Some(value)),
                None => match side {
                    Side::Left => self.left_done = true,
                    Side::Right => self.right_done = true,
                },
            }
        }
    }
}

/// Reads the first source until it ends or fails, then the second.
/// Created by [`SourceExt::choose`].
///
/// If both sources fail, the read fails with both errors aggregated.
#[derive(Debug)]
pub struct Choose<L, R> {
    left: L,
    right: R,
    phase: Phase,
}

#[derive(Debug)]
enum Phase {
    Left,
    Right { left_error: Option<Error> },
}

impl<L, R> Source for Choose<L, R>
where
    L: Source,
    R: Source<Item = L::Item>,
{
    type Item = L::Item;

    async fn read(&mut self) -> Result<Option<L::Item>, Error> {
        if let Phase::Left = self.phase {
            match self.left.read().await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => self.phase = Phase::Right { left_error: None },
                Err(error) => {
                    tracing::debug!(%error, "primary source failed, switching to fallback");
                    self.phase = Phase::Right {
                        left_error: Some(error),
                    };
                }
            }
        }
        match self.right.read().await {
            Ok(value) => Ok(value),
            Err(error) => match &self.phase {
                Phase::Right {
                    left_error: Some(left),
                } => Err(left.clone().combine(error)),
                _ => Err(error),
            },
        }
    }
}

trait DynSource<A>: Send {
    fn read_boxed(&mut self) -> BoxFuture<'_, Result<Option<A>, Error>>;
}

impl<S: Source> DynSource<S::Item> for S {
    fn read_boxed(&mut self) -> BoxFuture<'_, Result<Option<S::Item>, Error>> {
        Box::pin(self.read())
    }
}

/// A type-erased source. Created by [`SourceExt::boxed`].
pub struct BoxedSource<A> {
    inner: Box<dyn DynSource<A>>,
}

impl<A> fmt::Debug for BoxedSource<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSource").field("inner", &"<source>").finish()
    }
}

impl<A: Send + 'static> Source for BoxedSource<A> {
    type Item = A;

    fn read(&mut self) -> impl Future<Output = Result<Option<A>, Error>> + Send {
        self.inner.read_boxed()
    }
}

/// Combinators available on every [`Source`].
pub trait SourceExt: Source + Sized {
    /// Transform each value.
    fn map<B, F>(self, f: F) -> Map<Self, F>
    where
        F: FnMut(Self::Item) -> B + Send,
        B: Send,
    {
        Map { inner: self, f }
    }

    /// Replace each value with a source and read all of it (monadic bind).
    ///
    /// ```rust
    /// use millrace::channel::{source, SourceExt};
    ///
    /// # tokio_test::block_on(async {
    /// let repeated = source::from_iter(vec![1, 2]).and_then(|n| source::from_iter(vec![n; n]));
    /// assert_eq!(repeated.collect().await, Ok(vec![1, 2, 2]));
    /// # });
    /// ```
    fn and_then<T, F>(self, f: F) -> AndThen<Self, F, T>
    where
        T: Source,
        F: FnMut(Self::Item) -> T + Send,
    {
        AndThen {
            outer: self,
            f,
            current: None,
        }
    }

    /// Everything from this source, then everything from `next`.
    fn chain<R>(self, next: R) -> Chain<Self, R>
    where
        R: Source<Item = Self::Item>,
    {
        Chain {
            left: self,
            right: next,
            left_done: false,
        }
    }

    /// Interleave with `other` in arrival order.
    fn merge<R>(self, other: R) -> Merge<Self, R>
    where
        R: Source<Item = Self::Item>,
    {
        Merge {
            left: self,
            right: other,
            left_done: false,
            right_done: false,
        }
    }

    /// Read this source, falling back to `fallback` once it ends or fails.
    fn choose<R>(self, fallback: R) -> Choose<Self, R>
    where
        R: Source<Item = Self::Item>,
    {
        Choose {
            left: self,
            right: fallback,
            phase: Phase::Left,
        }
    }

    /// Read everything into a `Vec`.
    fn collect(self) -> impl Future<Output = Result<Vec<Self::Item>, Error>> + Send {
        self.fold(Vec::new(), |mut values, value| {
            values.push(value);
            values
        })
    }

    /// Fold every value into an accumulator.
    fn fold<S, F>(mut self, init: S, mut f: F) -> impl Future<Output = Result<S, Error>> + Send
    where
        S: Send,
        F: FnMut(S, Self::Item) -> S + Send,
    {
        async move {
            let mut acc = init;
            while let Some(value) = self.read().await? {
                acc = f(acc, value);
            }
            Ok(acc)
        }
    }

    /// Erase the source's type.
    fn boxed(self) -> BoxedSource<Self::Item>
    where
        Self: 'static,
    {
        BoxedSource {
            inner: Box::new(self),
        }
    }
}

impl<S: Source> SourceExt for S {}
