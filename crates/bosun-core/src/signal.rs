//! Broadcast-and-rearm change signal.
//!
//! [`ChangeSignal`] wakes every task currently waiting on it and then
//! rearms: a task that starts waiting after a notification sleeps until
//! the next one. Notifications are not queued, so several changes in
//! quick succession wake a waiter once and the waiter must re-read the
//! state it cares about.
//!
//! Internally the signal is a generation counter in a
//! [`tokio::sync::watch`] channel. Callers that need to check state and
//! then wait without a gap record [`generation`](ChangeSignal::generation)
//! first and use [`wait_past`](ChangeSignal::wait_past).

use std::time::Duration;

use tokio::sync::watch;

/// A repeatable wake-up for "something changed".
#[derive(Debug)]
pub struct ChangeSignal {
    tx: watch::Sender<u64>,
}

impl ChangeSignal {
    /// Create a signal at generation 0.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Current generation. Advances by one per [`notify`](Self::notify).
    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Release every current waiter.
    pub fn notify(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Wait for the next notification after this call.
    pub async fn wait(&self) {
        let seen = self.generation();
        self.wait_past(seen).await;
    }

    /// Wait until the generation differs from `seen` and return it.
    ///
    /// Returns at once if a notification already happened since `seen`
    /// was read.
    pub async fn wait_past(&self, seen: u64) -> u64 {
        let mut rx = self.tx.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if current != seen {
                return current;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                return current;
            }
        }
    }

    /// Like [`wait`](Self::wait) with an upper bound. Returns `false` on
    /// timeout.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}
