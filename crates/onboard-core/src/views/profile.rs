//! Profile page.

use std::sync::Arc;

use super::LoadState;
use crate::api::{ApiClient, ApiResult};
use crate::models::{ProfileUpdate, UserProfile};
use crate::session::Session;

pub struct ProfileView {
    client: ApiClient,
    session: Arc<Session>,
    state: LoadState<UserProfile>,
}

impl ProfileView {
    pub fn new(client: ApiClient, session: Arc<Session>) -> Self {
        Self {
            client,
            session,
            state: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &LoadState<UserProfile> {
        &self.state
    }

    pub async fn load(&mut self) -> &LoadState<UserProfile> {
        self.state = LoadState::Loading;
        let result = match self.session.require_auth() {
            Ok(()) => self.client.profile().await,
            Err(err) => Err(err),
        };
        self.state = LoadState::from_result(result);
        &self.state
    }

    /// Starting point for an edit: the loaded profile's editable fields.
    pub fn draft(&self) -> ProfileUpdate {
        self.state
            .ready()
            .map(ProfileUpdate::from)
            .unwrap_or_default()
    }

    /// Saves the profile and re-reads it. On a failed save the loaded state
    /// is kept.
    ///
    /// The re-read wins when it succeeds. When only the re-read fails, the
    /// saved profile returned by the update is shown instead.
    ///
    /// # Errors
    /// Returns the update failure (field messages for `Validation`), or a
    /// re-read failure that requires a new login.
    pub async fn update(&mut self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        self.session.require_auth()?;
        let saved = self.client.update_profile(update).await?;
        tracing::info!("profile updated");

        let fresh = match self.client.profile().await {
            Ok(fresh) => fresh,
            Err(err) if err.requires_login() => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "failed to re-read profile after update");
                saved
            }
        };
        self.state = LoadState::Ready(fresh.clone());
        Ok(fresh)
    }
}
