//! Cooperative cancellation for pipeline runs.
//!
//! A [`CancelToken`] is shared between whoever wants to stop a pipeline and
//! [`run_until_cancelled`](crate::proxy::run_until_cancelled). The runner
//! checks the token between steps and races it against every effect step;
//! the step in flight is dropped (Rust futures cancel on drop) and so is the
//! rest of the pipeline, which releases whatever it owns.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A clonable cancellation signal.
///
/// ```rust
/// use millrace::CancelToken;
///
/// # tokio_test::block_on(async {
/// let token = CancelToken::new();
/// let watcher = token.clone();
/// assert!(!watcher.is_cancelled());
/// token.cancel();
/// watcher.cancelled().await;
/// assert!(watcher.is_cancelled());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("cancellation requested");
            self.inner.notify.notify_waiters();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Outcome of a run that can be cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupted<E> {
    /// The token fired before the pipeline finished.
    Cancelled,
    /// The pipeline failed by itself.
    Failed(E),
}

impl<E> Interrupted<E> {
    /// True for [`Interrupted::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Interrupted::Cancelled)
    }

    /// The pipeline's own error, if that is why it stopped.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Interrupted::Failed(e) => Some(e),
            Interrupted::Cancelled => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Interrupted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupted::Cancelled => write!(f, "pipeline cancelled"),
            Interrupted::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Interrupted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Interrupted::Cancelled => None,
            Interrupted::Failed(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .expect("task ran");
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        token.cancelled().await;
    }

    #[test]
    fn interrupted_accessors() {
        assert!(Interrupted::<String>::Cancelled.is_cancelled());
        assert_eq!(Interrupted::Failed("e").into_failure(), Some("e"));
        assert_eq!(Interrupted::Failed("e").to_string(), "e");
    }
}
