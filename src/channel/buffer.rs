//! The shared state behind a channel's sink and source handles.
//!
//! The buffer and status live under one `std::sync::Mutex` that is never
//! held across an await. Waiting is done on two `Notify`s: `readable`
//! fires when a value arrives or the channel ends, `writable` when room
//! frees up or the channel ends. Every wait creates its `Notified` future
//! before inspecting the state, so a notification between the check and
//! the await is not lost.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::channel::config::{Capacity, ChannelConfig, Overflow};
use crate::error::Error;

/// Lifecycle of a channel.
///
/// A channel starts `Open` and moves at most once to a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Accepting values.
    Open,
    /// Finished normally; buffered values can still be read.
    Completed,
    /// Finished with an error, reported after buffered values are read.
    Failed(Error),
}

impl Status {
    /// True for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Open)
    }
}

pub(crate) enum Offer<A> {
    Accepted,
    Rejected(Error),
    Blocked(A),
}

struct State<A> {
    queue: VecDeque<A>,
    status: Status,
}

pub(crate) struct Shared<A> {
    state: Mutex<State<A>>,
    readable: Notify,
    writable: Notify,
    config: ChannelConfig,
    writers: AtomicUsize,
    readers: AtomicUsize,
}

impl<A> Shared<A> {
    pub(crate) fn new(config: ChannelConfig) -> Self {
        let status = if config.starts_closed() {
            Status::Completed
        } else {
            Status::Open
        };
        Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                status,
            }),
            readable: Notify::new(),
            writable: Notify::new(),
            config,
            writers: AtomicUsize::new(1),
            readers: AtomicUsize::new(1),
        }
    }

    // A panic while holding the lock cannot leave the queue half-updated,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State<A>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub(crate) fn offer(&self, value: A) -> Offer<A> {
        let mut state = self.lock();
        match &state.status {
            Status::Open => {}
            Status::Completed => return Offer::Rejected(Error::Closed),
            Status::Failed(error) => return Offer::Rejected(error.clone()),
        }
        match self.config.capacity() {
            Capacity::Unbounded => state.queue.push_back(value),
            Capacity::Latest => {
                state.queue.clear();
                state.queue.push_back(value);
            }
            Capacity::Bounded(limit) if state.queue.len() < limit => state.queue.push_back(value),
            Capacity::Bounded(_) => match self.config.overflow() {
                Overflow::Block => return Offer::Blocked(value),
                Overflow::Fail => return Offer::Rejected(Error::Full),
                Overflow::DropOldest => {
                    state.queue.pop_front();
                    state.queue.push_back(value);
                    tracing::trace!("channel full, dropped oldest value");
                }
            },
        }
        drop(state);
        self.readable.notify_waiters();
        Offer::Accepted
    }

    pub(crate) async fn post(&self, mut value: A) -> Result<(), Error> {
        loop {
            let room = self.writable.notified();
            match self.offer(value) {
                Offer::Accepted => return Ok(()),
                Offer::Rejected(error) => return Err(error),
                Offer::Blocked(returned) => {
                    tracing::trace!("channel full, writer waiting");
                    value = returned;
                }
            }
            room.await;
        }
    }

    // `None` while the channel is open and empty.
    pub(crate) fn take(&self) -> Option<Result<Option<A>, Error>> {
        let mut state = self.lock();
        if let Some(value) = state.queue.pop_front() {
            drop(state);
            self.writable.notify_waiters();
            return Some(Ok(Some(value)));
        }
        match &state.status {
            Status::Open => None,
            Status::Completed => Some(Ok(None)),
            Status::Failed(error) => Some(Err(error.clone())),
        }
    }

    pub(crate) async fn read(&self) -> Result<Option<A>, Error> {
        loop {
            let arrived = self.readable.notified();
            if let Some(outcome) = self.take() {
                return outcome;
            }
            arrived.await;
        }
    }

    // Move to `status` unless already terminal. Returns whether it moved.
    fn finish(&self, status: Status) -> bool {
        let mut state = self.lock();
        if state.status.is_terminal() {
            return false;
        }
        state.status = status;
        drop(state);
        self.readable.notify_waiters();
        self.writable.notify_waiters();
        true
    }

    pub(crate) fn complete(&self) {
        if self.finish(Status::Completed) {
            tracing::debug!("channel completed");
        }
    }

    pub(crate) fn fail(&self, error: Error) {
        let reason = error.to_string();
        if self.finish(Status::Failed(error)) {
            tracing::debug!(error = %reason, "channel failed");
        }
    }

    pub(crate) fn status(&self) -> Status {
        self.lock().status.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub(crate) fn add_writer(&self) {
        self.writers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn add_reader(&self) {
        self.readers.fetch_add(1, Ordering::SeqCst);
    }

    // The last writer gone means nothing more can arrive.
    pub(crate) fn drop_writer(&self) {
        if self.writers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.complete();
        }
    }

    // The last reader gone means buffered and future values are unreachable.
    pub(crate) fn drop_reader(&self) {
        if self.readers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.lock().queue.clear();
            if self.finish(Status::Completed) {
                tracing::debug!("channel closed, no readers left");
            }
        }
    }
}
