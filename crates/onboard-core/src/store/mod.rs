//! Credential storage.
//!
//! The credential pair is the only state the client persists. Every store
//! publishes its current value on a `watch` channel so that the session and
//! any running view observe logins, refreshes and logouts made through any
//! handle, including other processes sharing the same file.
//!
//! Tokens are never logged or displayed in full.

mod file;
mod memory;
mod watch;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::watch as channel;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
pub use watch::spawn_store_watcher;

/// Access/refresh token pair.
///
/// A missing key is `None`; an empty string is normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived bearer token sent on every protected request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    /// Longer-lived token exchanged for a new access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: non_empty(access.into()),
            refresh: non_empty(refresh.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }

    /// Returns a copy with a new access token and, if rotated, a new refresh token.
    #[must_use]
    pub fn with_access(&self, access: String, rotated_refresh: Option<String>) -> Self {
        Self {
            access: non_empty(access),
            refresh: rotated_refresh
                .and_then(non_empty)
                .or_else(|| self.refresh.clone()),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Durable, observable storage for the credential pair.
///
/// Writes are last-write-wins. Readers should re-read (or watch) instead of
/// caching a pair indefinitely.
pub trait CredentialStore: Send + Sync {
    /// Returns the current pair; both fields are `None` when nothing is stored.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<CredentialPair>;

    /// Persists the pair, removing keys whose value is `None`, and publishes it.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, pair: &CredentialPair) -> Result<()>;

    /// Removes both tokens.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<()> {
        self.save(&CredentialPair::default())
    }

    /// Subscribes to the published pair.
    fn subscribe(&self) -> channel::Receiver<CredentialPair>;

    /// Re-reads the backing storage and publishes the value if it changed
    /// outside this handle. Returns whether a change was published.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn reload(&self) -> Result<bool>;
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 || !token.is_char_boundary(12) {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_strings_normalize_to_none() {
        let pair = CredentialPair::new("", "  ");
        assert!(pair.is_empty());

        let pair = CredentialPair::new("A1", "");
        assert_eq!(pair.access.as_deref(), Some("A1"));
        assert_eq!(pair.refresh, None);
    }

    #[test]
    fn test_with_access_keeps_refresh_unless_rotated() {
        let pair = CredentialPair::new("A1", "R1");

        let refreshed = pair.with_access("A2".to_string(), None);
        assert_eq!(refreshed, CredentialPair::new("A2", "R1"));

        let rotated = pair.with_access("A2".to_string(), Some("R2".to_string()));
        assert_eq!(rotated, CredentialPair::new("A2", "R2"));
    }

    #[test]
    fn test_serialization_omits_missing_keys() {
        let pair = CredentialPair {
            access: Some("A1".to_string()),
            refresh: None,
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"access":"A1"}"#);

        let loaded: CredentialPair = serde_json::from_str("{}").unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(
            mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig"),
            "eyJhbGciOiJI..."
        );
        assert_eq!(mask_token("short"), "***");
    }
}
