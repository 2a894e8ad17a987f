//! Authenticated request pipeline.
//!
//! Every outbound call goes through [`ApiClient::with_auth_retry`]:
//! - the current access token (if any) is attached as a bearer credential;
//! - a 401 triggers one refresh exchange and one re-issue of the request;
//! - if no refresh token exists or the refresh fails, the store is cleared
//!   and [`AuthEvent::LoginRequired`] is broadcast.
//!
//! The pipeline imposes no timeouts; callers cancel by dropping the future.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use super::error::{ApiError, ApiErrorKind, ApiResult};
use crate::models::{ListPayload, RefreshRequest, RefreshedAccess};
use crate::store::{CredentialPair, CredentialStore, mask_token};

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const REFRESH_PATH: &str = "auth/refresh/";

/// Authentication transitions caused by the pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The access token was renewed through the refresh endpoint.
    Refreshed,
    /// Credentials were cleared; the user has to log in again.
    LoginRequired,
}

/// Cheap-to-clone handle to the REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn CredentialStore>,
    events: broadcast::Sender<AuthEvent>,
    /// Held while a refresh exchange is in flight so concurrent 401s share one renewal.
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Creates a client for `base_url` backed by `store`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, store: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("onboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Self::with_http(http, base_url, store)
    }

    /// Creates a client around an existing `reqwest::Client`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
    ) -> anyhow::Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let (events, _rx) = broadcast::channel(16);
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                store,
                events,
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Subscribes to refresh / forced-logout notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Resolves an API path (e.g. `courses/12/`) against the base URL.
    ///
    /// # Errors
    /// Returns a parse error if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::parse(format!("invalid endpoint '{path}': {err}")))
    }

    /// Runs `send` with the current access token, recovering from one 401.
    ///
    /// `send` receives the bearer token to attach (or `None`) and is called at
    /// most twice. The retry budget lives in this call only, so concurrent
    /// requests never share or mutate each other's attempt state.
    ///
    /// Non-401 responses are returned as-is; status checking is left to the caller.
    ///
    /// # Errors
    /// Returns a network error, the original 401 when no refresh token exists,
    /// or a `LoginRequired` error when the refresh exchange fails.
    pub async fn with_auth_retry<F, Fut>(&self, mut send: F) -> ApiResult<Response>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut access = self.credentials()?.access;
        let mut retried = false;

        loop {
            let response = send(access.clone())
                .await
                .map_err(|err| ApiError::network(&err))?;

            if response.status() != StatusCode::UNAUTHORIZED || retried {
                return Ok(response);
            }

            retried = true;
            let body = response.text().await.unwrap_or_default();
            let rejected = ApiError::from_status(StatusCode::UNAUTHORIZED, &body);
            access = Some(self.renew_access(access.as_deref(), rejected).await?);
            tracing::debug!("re-issuing request with renewed access token");
        }
    }

    /// Obtains a usable access token after `rejected_access` got a 401.
    async fn renew_access(
        &self,
        rejected_access: Option<&str>,
        rejected: ApiError,
    ) -> ApiResult<String> {
        let _guard = self.inner.refresh_lock.lock().await;

        let pair = self.credentials()?;
        // Another request may have renewed while we waited for the lock.
        if let Some(current) = pair.access.as_deref()
            && Some(current) != rejected_access
        {
            return Ok(current.to_string());
        }

        let Some(refresh) = pair.refresh.as_deref() else {
            tracing::warn!("access token rejected and no refresh token is stored");
            self.force_logout();
            return Err(rejected);
        };

        match self.refresh_access(refresh).await {
            Ok(renewed) => {
                let updated = pair.with_access(renewed.access.clone(), renewed.refresh);
                self.inner
                    .store
                    .save(&updated)
                    .map_err(|err| ApiError::storage(&err))?;
                tracing::info!(access = %mask_token(&renewed.access), "access token refreshed");
                let _ = self.inner.events.send(AuthEvent::Refreshed);
                Ok(renewed.access)
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed");
                self.force_logout();
                Err(ApiError {
                    kind: ApiErrorKind::LoginRequired,
                    message: format!("Session expired: {}", err.message),
                    ..err
                })
            }
        }
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    /// Returns an error for any non-success response or transport failure.
    pub async fn refresh_access(&self, refresh: &str) -> ApiResult<RefreshedAccess> {
        self.post_public(REFRESH_PATH, &RefreshRequest { refresh })
            .await
    }

    /// Clears the store and tells listeners that a fresh login is needed.
    fn force_logout(&self) {
        if let Err(err) = self.inner.store.clear() {
            tracing::warn!(error = %format!("{err:#}"), "failed to clear credentials");
        }
        let _ = self.inner.events.send(AuthEvent::LoginRequired);
    }

    fn credentials(&self) -> ApiResult<CredentialPair> {
        self.inner
            .store
            .load()
            .map_err(|err| ApiError::storage(&err))
    }

    /// Sends an authenticated request and fails on non-success statuses.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] for the response or transport failure.
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::debug_span!("api", %method, path, request_id = %request_id);

        async {
            let response = self
                .with_auth_retry(|access| {
                    let mut builder = self
                        .inner
                        .http
                        .request(method.clone(), url.clone())
                        .header(REQUEST_ID_HEADER, &request_id);
                    if !query.is_empty() {
                        builder = builder.query(query);
                    }
                    if let Some(body) = body {
                        builder = builder.json(body);
                    }
                    if let Some(token) = access {
                        builder = builder.bearer_auth(token);
                    }
                    builder.send()
                })
                .await?;
            let response = ensure_success(response).await?;
            tracing::debug!(status = response.status().as_u16(), "response");
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// `GET` decoding a JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::request`]; also fails if the body does not decode.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get_with_query(path, &[]).await
    }

    /// `GET` with query parameters.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self
            .request::<()>(Method::GET, path, query, None)
            .await?;
        decode(response).await
    }

    /// `GET` of a list endpoint, accepting bare and paginated envelopes.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let payload: ListPayload<T> = self.get_with_query(path, query).await?;
        Ok(payload.into_vec())
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path, &[], Some(body)).await?;
        decode(response).await
    }

    /// `POST` without a body (action endpoints such as lesson completion).
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self
            .request::<()>(Method::POST, path, &[], None)
            .await?;
        decode(response).await
    }

    /// `PUT` with a JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::PUT, path, &[], Some(body)).await?;
        decode(response).await
    }

    /// `POST` to an unauthenticated endpoint: no bearer, no refresh handling.
    ///
    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::debug_span!("api", method = "POST", path, request_id = %request_id);

        async {
            let response = self
                .inner
                .http
                .post(url)
                .header(REQUEST_ID_HEADER, &request_id)
                .json(body)
                .send()
                .await
                .map_err(|err| ApiError::network(&err))?;
            let response = ensure_success(response).await?;
            decode(response).await
        }
        .instrument(span)
        .await
    }
}

fn normalize_base_url(base_url: &str) -> anyhow::Result<Url> {
    let trimmed = base_url.trim();
    // A trailing slash keeps the last path segment (e.g. `/api`) when joining.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("Invalid API URL '{base_url}'"))
}

async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status, &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = response.text().await.map_err(|err| ApiError::network(&err))?;
    // 204 / empty bodies decode as an empty object.
    let body = if body.trim().is_empty() { "{}" } else { &body };
    serde_json::from_str(body).map_err(ApiError::parse)
}
