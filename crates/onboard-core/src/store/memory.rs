//! In-process credential store.

use anyhow::Result;
use tokio::sync::watch;

use super::{CredentialPair, CredentialStore};

/// Credential store that lives only as long as the process.
///
/// The watch channel is the storage; there is nothing external to reload.
pub struct MemoryCredentialStore {
    tx: watch::Sender<CredentialPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_pair(CredentialPair::default())
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        let (tx, _rx) = watch::channel(pair);
        Self { tx }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<CredentialPair> {
        Ok(self.tx.borrow().clone())
    }

    fn save(&self, pair: &CredentialPair) -> Result<()> {
        self.tx.send_replace(pair.clone());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<CredentialPair> {
        self.tx.subscribe()
    }

    fn reload(&self) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_is_visible_to_subscribers() {
        let store = MemoryCredentialStore::new();
        let mut rx = store.subscribe();

        store.save(&CredentialPair::new("A1", "R1")).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CredentialPair::new("A1", "R1"));
        assert_eq!(store.load().unwrap(), CredentialPair::new("A1", "R1"));
    }
}
