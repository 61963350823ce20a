//! # Authenticated Request Pipeline
//!
//! [`ApiClient::authed_fetch`] wraps every call to a protected endpoint:
//!
//! 1. attach `x-device-id` and, when a token is stored, `Authorization: Bearer`
//! 2. send the request
//! 3. on `401 Unauthorized`, refresh the token pair once, persist it, rebuild the
//!    headers from the caller's originals and replay the request
//! 4. return the final response verbatim, whatever its status
//!
//! A call makes at most one refresh and at most one replay. Non-401 responses
//! are returned untouched; interpreting their status is the caller's job.
//!
//! ## Concurrent refreshes
//!
//! Calls that hit 401 at the same time share one refresh. The refresh runs under
//! an async mutex; a waiter that finds the stored access token already changed
//! since its first attempt uses that token instead of refreshing again.
//!
//! A refresh the backend rejected with a 4xx is remembered together with the
//! refresh token it used. Callers still holding that token, including ones
//! that were waiting on the guard, fail with `SessionExpired` without calling
//! the backend again. A login or handoff stores a new token and clears this. Transport errors and
//! 5xx rejections are not remembered, so the next call tries again.
//!
//! The guard lives in the `ApiClient` and is shared by its clones. Two clients
//! built separately over the same store refresh independently.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use leadhub::client::{ApiClient, Config, MemoryStore, RequestOptions};
//!
//! # async fn example() -> Result<(), leadhub::shared::error::ClientError> {
//! let client = ApiClient::new(Config::new(), Arc::new(MemoryStore::new()))?;
//! let response = client.authed_fetch("/api/v1/leads", RequestOptions::get()).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use tokio::sync::Mutex;

use crate::client::config::Config;
use crate::client::credentials::CredentialStore;
use crate::client::device::DeviceIdentity;
use crate::client::http::{build_headers, RequestOptions};
use crate::client::refresh::{TokenRefresher, REFRESH_PATH};
use crate::client::storage::KeyValueStore;
use crate::shared::error::ClientError;

/// Refresh the backend turned down for good
#[derive(Debug)]
struct RejectedRefresh {
    refresh_token: String,
    status: u16,
}

/// Client for the LeadHub API
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) config: Config,
    pub(crate) http: Client,
    pub(crate) device: DeviceIdentity,
    pub(crate) credentials: CredentialStore,
    refresher: TokenRefresher,
    refresh_guard: Arc<Mutex<Option<RejectedRefresh>>>,
}

impl ApiClient {
    /// Create a client over `store`.
    ///
    /// Concurrent refreshes are only deduplicated between clones of one
    /// client; share a single `ApiClient` per store.
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_http_client(config, store, http))
    }

    /// Create a client with a preconfigured `reqwest::Client`
    pub fn with_http_client(config: Config, store: Arc<dyn KeyValueStore>, http: Client) -> Self {
        let device = DeviceIdentity::new(store.clone());
        let credentials = CredentialStore::new(store);
        let refresher =
            TokenRefresher::new(http.clone(), config.api_url(REFRESH_PATH), device.clone());
        Self {
            config,
            http,
            device,
            credentials,
            refresher,
            refresh_guard: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Persisted device identifier
    pub fn device_id(&self) -> String {
        self.device.device_id()
    }

    /// Send `options` to `path` with device and bearer headers, refreshing the
    /// session once on 401.
    pub async fn authed_fetch(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let url = self.config.api_url(path);
        let access_token = self.credentials.access_token();

        let response = self.send(&url, &options, &access_token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(method = %options.method, %url, "unauthorized, refreshing session");
        let fresh_token = self.refresh_after_unauthorized(&access_token).await?;

        let retried = self.send(&url, &options, &fresh_token).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                method = %options.method,
                %url,
                "request still unauthorized after token refresh"
            );
        }
        Ok(retried)
    }

    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        access_token: &str,
    ) -> Result<Response, ClientError> {
        let headers = build_headers(&options.headers, &self.device.device_id(), access_token)?;

        let mut request = self
            .http
            .request(options.method.clone(), url)
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        tracing::debug!(
            method = %options.method,
            %url,
            status = response.status().as_u16(),
            "response"
        );
        Ok(response)
    }

    /// Obtain a fresh access token after a 401 on a request that used
    /// `stale_token`. Returns the token to retry with.
    async fn refresh_after_unauthorized(&self, stale_token: &str) -> Result<String, ClientError> {
        let mut rejected = self.refresh_guard.lock().await;

        let current = self.credentials.access_token();
        if !current.is_empty() && current != stale_token {
            tracing::debug!("session already refreshed by a concurrent request");
            return Ok(current);
        }

        let refresh_token = self.credentials.refresh_token();
        if let Some(previous) = rejected.as_ref() {
            if !refresh_token.is_empty() && previous.refresh_token == refresh_token {
                tracing::debug!("refresh token already rejected, not retrying");
                return Err(ClientError::SessionExpired {
                    status: previous.status,
                });
            }
        }

        match self.refresher.refresh(&refresh_token).await {
            Ok(pair) => {
                *rejected = None;
                self.credentials.set_tokens(&pair)?;
                tracing::info!("session refreshed");
                Ok(pair.access_token)
            }
            Err(ClientError::SessionExpired { status }) if (400..500).contains(&status) => {
                *rejected = Some(RejectedRefresh {
                    refresh_token,
                    status,
                });
                Err(ClientError::SessionExpired { status })
            }
            Err(e) => Err(e),
        }
    }
}
