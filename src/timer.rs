//! Cancellable one-shot timers
//!
//! Thin wrapper over a spawned task: schedule an action after a delay and
//! keep a cancellation capability. Dropping the handle does NOT cancel the
//! timer - a fired expiry task must be able to drop its own handle while
//! running. Cancellation is always an explicit call.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to a scheduled one-shot action.
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    /// Run `action` after `delay`, unless cancelled first.
    pub fn schedule<F>(delay: Duration, action: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        Self { handle }
    }

    /// Cancel the timer. A no-op if the action already ran.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the action ran (or the timer was cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn action_runs_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = Arc::clone(&fired);
        let _timer = ExpiryTimer::schedule(Duration::from_secs(60), async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_action() {
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = Arc::clone(&fired);
        let timer = ExpiryTimer::schedule(Duration::from_secs(60), async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_detaches_without_cancelling() {
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = Arc::clone(&fired);
        drop(ExpiryTimer::schedule(Duration::from_secs(60), async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
