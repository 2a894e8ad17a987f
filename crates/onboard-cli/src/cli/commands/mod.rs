//! CLI command handlers.

pub mod admin;
pub mod auth;
pub mod config;
pub mod courses;
pub mod dashboard;
pub mod profile;
pub mod quiz;
pub mod render;
pub mod session;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use onboard_core::api::ApiClient;
use onboard_core::config::Config;
use onboard_core::session::Session;
use onboard_core::store::{CredentialStore, FileCredentialStore};
use onboard_core::views::LoadState;

/// Everything a command needs to talk to the API.
pub struct App {
    pub config: Config,
    pub store: Arc<dyn CredentialStore>,
    pub client: ApiClient,
    pub session: Arc<Session>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::open_default().context("open credential store")?);
        let client = ApiClient::new(&config.api_url, Arc::clone(&store))
            .with_context(|| format!("create API client for {}", config.api_url))?;
        let session = Arc::new(Session::new(Arc::clone(&store)));
        Ok(Self {
            config,
            store,
            client,
            session,
        })
    }
}

/// Unwraps a loaded view, turning the other states into errors.
pub fn ready<T>(state: &LoadState<T>) -> Result<&T> {
    match state {
        LoadState::Ready(value) => Ok(value),
        LoadState::Denied(message) => bail!("Access denied: {message}"),
        LoadState::Failed(err) => Err(err.clone().into()),
        LoadState::Loading => bail!("Still loading"),
    }
}
