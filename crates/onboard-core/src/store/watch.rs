//! Polling watcher for credential changes made by other processes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::CredentialStore;

/// Re-reads the store every `interval` until `cancel` fires.
///
/// Changes are published on the store's own channel, so every subscriber
/// (the session included) sees them without further wiring.
pub fn spawn_store_watcher(
    store: Arc<dyn CredentialStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the store was just loaded.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.reload() {
                Ok(true) => tracing::info!("credentials changed externally"),
                Ok(false) => {}
                Err(err) => tracing::warn!(error = %format!("{err:#}"), "failed to re-read credentials"),
            }
        }

        tracing::debug!("credential watcher stopped");
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::store::{CredentialPair, FileCredentialStore};

    #[tokio::test]
    async fn test_watcher_picks_up_other_handle_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let ours: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::open(&path).unwrap());
        let theirs = FileCredentialStore::open(&path).unwrap();
        let mut rx = ours.subscribe();

        let cancel = CancellationToken::new();
        let handle = spawn_store_watcher(
            Arc::clone(&ours),
            Duration::from_millis(20),
            cancel.clone(),
        );

        theirs.save(&CredentialPair::new("A1", "R1")).unwrap();

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("watcher should publish the change")
            .unwrap();
        assert_eq!(*rx.borrow(), CredentialPair::new("A1", "R1"));

        cancel.cancel();
        handle.await.unwrap();
    }
}
