//! Cooperative cancellation signal.
//!
//! The transport adapter owns the moment a request is abandoned (the client
//! closed the connection, the abort signal fired). It surfaces that moment to
//! handler code as a [`CancelSignal`] carried by the event. Cancellation is
//! cooperative: handler code polls [`CancelSignal::is_triggered`] or awaits
//! [`CancelSignal::cancelled`] and stops producing output; nothing forcibly
//! terminates a handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// A shared, one-way cancellation flag.
///
/// Cloning yields another handle to the same underlying signal. Once
/// triggered, the signal stays triggered for the rest of the request.
#[derive(Clone, Default)]
pub struct CancelSignal {
    inner: Arc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    triggered: AtomicBool,
    notify: Notify,
}

impl std::fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelSignal")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}

impl CancelSignal {
    /// Create a fresh, untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the signal as triggered and wake every pending waiter.
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolve once the signal is triggered.
    ///
    /// Returns immediately if the signal already fired.
    pub async fn cancelled(&self) {
        loop {
            if self.is_triggered() {
                return;
            }
            let notified = self.inner.notify.notified();
            // Re-check after registering interest so a trigger racing the
            // registration is not lost.
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_untriggered() {
        let signal = CancelSignal::new();
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn trigger_is_visible_to_clones() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        signal.trigger();
        assert!(observer.is_triggered());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_trigger() {
        let signal = CancelSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        signal.trigger();
        task.await.expect("waiter task");
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_triggered() {
        let signal = CancelSignal::new();
        signal.trigger();
        signal.cancelled().await;
    }
}
