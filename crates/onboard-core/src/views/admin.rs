//! Staff-only team progress overview.

use std::sync::Arc;

use super::LoadState;
use crate::api::ApiClient;
use crate::models::AdminProgressRecord;
use crate::session::Session;

pub struct AdminProgressView {
    client: ApiClient,
    session: Arc<Session>,
    state: LoadState<Vec<AdminProgressRecord>>,
}

impl AdminProgressView {
    pub fn new(client: ApiClient, session: Arc<Session>) -> Self {
        Self {
            client,
            session,
            state: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &LoadState<Vec<AdminProgressRecord>> {
        &self.state
    }

    /// A 403 from the server turns into [`LoadState::Denied`]; it is not retried.
    pub async fn load(&mut self) -> &LoadState<Vec<AdminProgressRecord>> {
        self.state = LoadState::Loading;
        let result = match self.session.require_auth() {
            Ok(()) => self.client.admin_progress().await,
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            tracing::debug!(error = %err, "admin progress unavailable");
        }
        self.state = LoadState::from_result(result);
        &self.state
    }
}
