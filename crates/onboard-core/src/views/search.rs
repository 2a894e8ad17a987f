//! Debounced, cancellable loader for search-as-you-type inputs.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use super::load::{LoadId, LoadSlot};
use crate::api::ApiResult;

/// Default quiet period before a search request is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Runs at most one search at a time and applies only the newest result.
///
/// Each [`SearchLoader::submit`] waits for the debounce delay before running
/// its fetch. A newer submission cancels the older one whether it is still
/// waiting or already on the wire (dropping the future aborts the request).
/// Results that lose the race anyway are discarded by
/// [`SearchLoader::next_applied`].
pub struct SearchLoader<T> {
    delay: Duration,
    slot: LoadSlot,
    tx: mpsc::UnboundedSender<(LoadId, ApiResult<T>)>,
    rx: mpsc::UnboundedReceiver<(LoadId, ApiResult<T>)>,
}

impl<T: Send + 'static> SearchLoader<T> {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            slot: LoadSlot::default(),
            tx,
            rx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `fetch` after the debounce delay, superseding any pending search.
    pub fn submit<F>(&mut self, fetch: F) -> LoadId
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let (id, cancel) = self.slot.start();
        let tx = self.tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::trace!(load = id.0, "search cancelled");
                    return;
                }
                result = async {
                    tokio::time::sleep(delay).await;
                    fetch.await
                } => result,
            };
            let _ = tx.send((id, result));
        });

        id
    }

    /// True while the latest submission has not been applied yet.
    pub fn is_pending(&self) -> bool {
        self.slot.is_running()
    }

    /// Waits for the newest submission's result, dropping stale ones.
    ///
    /// Pending forever when nothing is in flight; use it inside `select!`.
    pub async fn next_applied(&mut self) -> (LoadId, ApiResult<T>) {
        loop {
            // `self.tx` keeps the channel open, so `None` never arrives.
            let Some((id, result)) = self.rx.recv().await else {
                return std::future::pending().await;
            };
            if self.slot.finish_if_active(id) {
                return (id, result);
            }
            tracing::debug!(load = id.0, "discarding superseded search result");
        }
    }

    /// Cancels the pending search, if any.
    pub fn cancel(&mut self) {
        self.slot.cancel();
    }
}

impl<T> Drop for SearchLoader<T> {
    fn drop(&mut self) {
        self.slot.cancel();
    }
}
