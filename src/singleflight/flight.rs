//! Call Coalescer
//!
//! Collapses concurrent calls for the same key into one execution. The
//! first caller (the leader) runs the work inline; later callers subscribe
//! to the leader's `watch` channel and receive a clone of its result.
//! Nothing is remembered once the call completes.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

/// Registry of in-flight calls keyed by string
pub struct Flight<T> {
    calls: Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
}

impl<T> Default for Flight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

/// Removes the leader's registry entry when dropped, including when the
/// leader's future is abandoned mid-call.
struct CallGuard<'a, T> {
    flight: &'a Flight<T>,
    key: &'a str,
}

impl<T> Drop for CallGuard<'_, T> {
    fn drop(&mut self) {
        self.flight.calls.lock().remove(self.key);
    }
}

impl<T: Clone> Flight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key` unless a call for `key` is already in flight,
    /// in which case wait for that call and return its result.
    pub async fn work<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let tx = loop {
            let mut rx = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(rx) => rx.clone(),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        calls.insert(key.to_owned(), rx);
                        break tx;
                    }
                }
            };

            trace!(key, "joining in-flight call");
            let finished = rx
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|done| done.clone());
            if let Some(value) = finished {
                return value;
            }
            // leader abandoned the call without a result; try to take over
        };

        let guard = CallGuard { flight: self, key };
        let value = work().await;
        tx.send_replace(Some(value.clone()));
        drop(guard);
        value
    }

    /// Number of calls currently in flight
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

// =============================================================================
// Tests
// =============================================================================
