//! Shutdown coordination for the watcher.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Why the root context was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// An OS interrupt signal was received.
    Interrupt,
    /// The process is tearing down after the main flow returned.
    Shutdown,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::Interrupt => write!(f, "interrupt signal received"),
            CancelCause::Shutdown => write!(f, "shutdown requested"),
        }
    }
}

/// Coordinator for graceful shutdown.
///
/// Cloning yields another handle to the same root context. The first call to
/// [`Shutdown::trigger`] records the cause; later calls are no-ops.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<CancelCause>>>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Trigger the shutdown signal.
    ///
    /// Returns `true` if this call performed the cancellation.
    pub fn trigger(&self, cause: CancelCause) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        })
    }

    /// Non-blocking check.
    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The recorded cause, if cancelled.
    pub fn cause(&self) -> Option<CancelCause> {
        *self.tx.borrow()
    }

    /// Resolve once the shutdown signal has been triggered.
    pub async fn cancelled(&self) -> CancelCause {
        let mut rx = self.tx.subscribe();
        let cause = match rx.wait_for(Option::is_some).await {
            Ok(cause) => *cause,
            // Unreachable while `self` holds the sender.
            Err(_) => None,
        };
        cause.unwrap_or(CancelCause::Shutdown)
    }

    /// Drive `fut` to completion unless the shutdown signal fires first.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_triggered() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown")
            .field("cause", &self.cause())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_trigger_wins() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        assert!(shutdown.trigger(CancelCause::Interrupt));
        assert!(!shutdown.trigger(CancelCause::Shutdown));
        assert_eq!(shutdown.cause(), Some(CancelCause::Interrupt));
    }

    #[test]
    fn test_clones_share_state() {
        let shutdown = Shutdown::new();
        let other = shutdown.clone();
        other.trigger(CancelCause::Shutdown);
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger(CancelCause::Interrupt);

        let cause = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cause, CancelCause::Interrupt);
    }

    #[tokio::test]
    async fn test_run_until_cancelled() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.run_until_cancelled(async { 7 }).await, Some(7));

        shutdown.trigger(CancelCause::Shutdown);
        let out = shutdown
            .run_until_cancelled(std::future::pending::<()>())
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_after_trigger_returns_cause() {
        let shutdown = Shutdown::new();
        shutdown.trigger(CancelCause::Interrupt);
        assert_eq!(shutdown.cancelled().await, CancelCause::Interrupt);
        assert_eq!(shutdown.clone().cancelled().await, CancelCause::Interrupt);
    }
}
