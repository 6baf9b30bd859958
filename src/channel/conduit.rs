//! A sink and a source over the same channel, adaptable on either side.

use crate::channel::config::ChannelConfig;
use crate::channel::sink::{BoxedSink, Sink, SinkExt};
use crate::channel::source::{BoxedSource, Source, SourceExt};
use crate::channel::channel;
use crate::error::Error;

/// One channel seen as a `B`-yielding source fed by an `A`-accepting sink.
///
/// A fresh conduit has `A == B`; [`comap`](Self::comap) and
/// [`map`](Self::map) adapt the two ends independently.
///
/// ```rust
/// use millrace::channel::{ChannelConfig, Conduit};
///
/// # tokio_test::block_on(async {
/// let mut conduit = Conduit::<i32, i32>::new(ChannelConfig::unbounded())
///     .comap(|s: &'static str| s.len() as i32)
///     .map(|n: i32| n * 100);
///
/// conduit.post("four").await.unwrap();
/// conduit.complete();
/// assert_eq!(conduit.read().await, Ok(Some(400)));
/// assert_eq!(conduit.read().await, Ok(None));
/// # });
/// ```
#[derive(Debug)]
pub struct Conduit<A, B> {
    sink: BoxedSink<A>,
    source: BoxedSource<B>,
}

impl<A: Send + 'static> Conduit<A, A> {
    /// A conduit over a new channel.
    pub fn new(config: ChannelConfig) -> Self {
        let (sink, source) = channel(config);
        Conduit {
            sink: sink.boxed(),
            source: source.boxed(),
        }
    }
}

impl<A, B> Conduit<A, B>
where
    A: Send + 'static,
    B: Send + 'static,
{
    /// The writing end.
    pub fn sink(&self) -> &BoxedSink<A> {
        &self.sink
    }

    /// The reading end.
    pub fn source_mut(&mut self) -> &mut BoxedSource<B> {
        &mut self.source
    }

    /// Take the two ends apart.
    pub fn split(self) -> (BoxedSink<A>, BoxedSource<B>) {
        (self.sink, self.source)
    }

    /// Accept `C` instead of `A`.
    pub fn comap<C, F>(self, f: F) -> Conduit<C, B>
    where
        C: Send + 'static,
        F: Fn(C) -> A + Send + Sync + 'static,
    {
        Conduit {
            sink: self.sink.comap(f).boxed(),
            source: self.source,
        }
    }

    /// Yield `C` instead of `B`.
    pub fn map<C, F>(self, f: F) -> Conduit<A, C>
    where
        C: Send + 'static,
        F: FnMut(B) -> C + Send + 'static,
    {
        Conduit {
            sink: self.sink,
            source: self.source.map(f).boxed(),
        }
    }

    /// Post through the sink end.
    pub async fn post(&self, value: A) -> Result<(), Error> {
        self.sink.post(value).await
    }

    /// Read from the source end.
    pub async fn read(&mut self) -> Result<Option<B>, Error> {
        self.source.read().await
    }

    /// Complete the channel.
    pub fn complete(&self) {
        self.sink.complete();
    }

    /// Fail the channel.
    pub fn fail(&self, error: Error) {
        self.sink.fail(error);
    }
}
