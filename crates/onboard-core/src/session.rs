//! Session context.
//!
//! `Session` is the only writer of credentials outside the request pipeline.
//! Its state is a projection of the credential store: saving to the store
//! publishes on the store's watch channel, so state and storage never diverge.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::store::{CredentialPair, CredentialStore};

/// Read-only snapshot of the authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    /// True while either token is stored. A refresh token alone is enough:
    /// the pipeline renews the access token on the first 401.
    pub fn has_credentials(&self) -> bool {
        self.access.is_some() || self.refresh.is_some()
    }
}

impl From<&CredentialPair> for SessionState {
    fn from(pair: &CredentialPair) -> Self {
        Self {
            access: pair.access.clone(),
            refresh: pair.refresh.clone(),
        }
    }
}

/// Receiver of session state changes.
pub struct SessionWatch {
    rx: watch::Receiver<CredentialPair>,
}

impl SessionWatch {
    /// Waits for the next change and returns the new state.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(SessionState::from(&*self.rx.borrow_and_update()))
    }

    pub fn current(&self) -> SessionState {
        SessionState::from(&*self.rx.borrow())
    }
}

pub struct Session {
    store: Arc<dyn CredentialStore>,
    rx: watch::Receiver<CredentialPair>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let rx = store.subscribe();
        Self { store, rx }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(&*self.rx.borrow())
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.store.subscribe(),
        }
    }

    /// Commits both tokens.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn login(&self, access: &str, refresh: &str) -> anyhow::Result<()> {
        self.store.save(&CredentialPair::new(access, refresh))?;
        tracing::info!("session started");
        Ok(())
    }

    /// Clears both tokens. Calling it on an empty session is a no-op.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn logout(&self) -> anyhow::Result<()> {
        let was_authenticated = !self.store.load()?.is_empty();
        self.store.clear()?;
        if was_authenticated {
            tracing::info!("session ended");
        }
        Ok(())
    }

    /// Guard for protected reads: fails without issuing any request when
    /// neither token is stored.
    ///
    /// # Errors
    /// Returns `LoginRequired` when the session holds no credentials.
    pub fn require_auth(&self) -> ApiResult<()> {
        if self.state().has_credentials() {
            Ok(())
        } else {
            Err(ApiError::login_required("Not logged in"))
        }
    }

    /// Logs in with username and password, then commits the returned tokens.
    ///
    /// # Errors
    /// Returns the login failure, or a storage error if the tokens cannot be saved.
    pub async fn authenticate(
        &self,
        client: &ApiClient,
        username: &str,
        password: &str,
    ) -> ApiResult<()> {
        let tokens = client.login(username, password).await?;
        self.login(&tokens.access, &tokens.refresh)
            .map_err(|err| ApiError::storage(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;
    use crate::store::MemoryCredentialStore;

    fn session() -> Session {
        Session::new(Arc::new(MemoryCredentialStore::new()))
    }

    #[test]
    fn test_login_updates_state_immediately() {
        let session = session();
        assert!(!session.state().is_authenticated());

        session.login("A1", "R1").unwrap();

        let state = session.state();
        assert_eq!(state.access.as_deref(), Some("A1"));
        assert_eq!(state.refresh.as_deref(), Some("R1"));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let session = session();
        session.login("A1", "R1").unwrap();

        session.logout().unwrap();
        let first = session.state();
        session.logout().unwrap();

        assert_eq!(first, session.state());
        assert_eq!(first, SessionState::default());
    }

    #[test]
    fn test_require_auth_without_token() {
        let session = session();
        let err = session.require_auth().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::LoginRequired);

        session.login("A1", "").unwrap();
        assert!(session.require_auth().is_ok());
    }

    #[test]
    fn test_refresh_token_alone_passes_guard() {
        let session = session();
        session.login("", "R1").unwrap();

        assert!(!session.state().is_authenticated());
        assert!(session.state().has_credentials());
        assert!(session.require_auth().is_ok());

        session.logout().unwrap();
        assert!(session.require_auth().is_err());
    }

    #[tokio::test]
    async fn test_subscribers_see_store_writes() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let session = Session::new(Arc::clone(&store));
        let mut watch = session.subscribe();

        // A pipeline refresh writes the store directly.
        store.save(&CredentialPair::new("A2", "R1")).unwrap();

        let state = watch.changed().await.unwrap();
        assert_eq!(state.access.as_deref(), Some("A2"));
        assert_eq!(session.state().access.as_deref(), Some("A2"));
    }
}
