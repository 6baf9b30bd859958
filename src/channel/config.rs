//! Channel configuration.

/// How many values a channel buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Capacity {
    /// No limit; posts never wait.
    #[default]
    Unbounded,
    /// At most `n` values; what happens beyond that is the [`Overflow`] policy.
    Bounded(usize),
    /// Keep only the newest value; each post replaces what is buffered.
    Latest,
}

/// What a post does when a bounded channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Overflow {
    /// Wait until a reader makes room.
    #[default]
    Block,
    /// Fail the post with [`Error::Full`](crate::Error::Full).
    Fail,
    /// Evict the oldest buffered value to make room.
    DropOldest,
}

/// Configuration for [`channel`](crate::channel::channel).
///
/// # Example
///
/// ```rust
/// use millrace::channel::{Capacity, ChannelConfig, Overflow};
///
/// let config = ChannelConfig::bounded(16).with_overflow(Overflow::DropOldest);
/// assert_eq!(config.capacity(), Capacity::Bounded(16));
/// assert_eq!(config.overflow(), Overflow::DropOldest);
/// assert!(!config.starts_closed());
///
/// // The default is an open, unbounded channel.
/// assert_eq!(ChannelConfig::default(), ChannelConfig::unbounded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    capacity: Capacity,
    overflow: Overflow,
    #[cfg_attr(feature = "serde", serde(default))]
    closed: bool,
}

impl ChannelConfig {
    /// An open channel with no buffer limit.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// An open channel holding at most `n` values; writers wait when it is
    /// full unless [`with_overflow`](Self::with_overflow) says otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero: a zero-sized buffer could never accept a value.
    pub fn bounded(n: usize) -> Self {
        assert!(n > 0, "bounded channel capacity must be at least 1");
        Self {
            capacity: Capacity::Bounded(n),
            ..Self::default()
        }
    }

    /// An open channel that keeps only the newest value.
    pub fn latest() -> Self {
        Self {
            capacity: Capacity::Latest,
            ..Self::default()
        }
    }

    /// Set the policy for posts to a full bounded channel.
    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Create the channel already completed.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// The buffer limit.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// The overflow policy.
    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Whether channels built from this configuration start completed.
    pub fn starts_closed(&self) -> bool {
        self.closed
    }
}
