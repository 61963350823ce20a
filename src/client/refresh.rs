//! Token refresh client
//!
//! Exchanges a refresh token for a new access/refresh pair. It only talks to
//! the network; persisting the returned pair is left to the caller.

use reqwest::Client;

use crate::client::device::{DeviceIdentity, DEVICE_ID_HEADER};
use crate::client::http::decode_json;
use crate::shared::auth::{RefreshTokenRequest, TokenPair};
use crate::shared::error::ClientError;

/// Refresh endpoint path
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

#[derive(Clone)]
pub struct TokenRefresher {
    http: Client,
    url: String,
    device: DeviceIdentity,
}

impl TokenRefresher {
    pub fn new(http: Client, url: String, device: DeviceIdentity) -> Self {
        Self { http, url, device }
    }

    /// Exchange `refresh_token` for a new pair.
    ///
    /// Fails with `NoRefreshToken` before touching the network when the token
    /// is empty, and with `SessionExpired` when the backend rejects it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        if refresh_token.is_empty() {
            return Err(ClientError::NoRefreshToken);
        }

        let request = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };

        let response = self
            .http
            .post(&self.url)
            .header(DEVICE_ID_HEADER, self.device.device_id())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "token refresh rejected");
            return Err(ClientError::SessionExpired {
                status: status.as_u16(),
            });
        }

        let pair: TokenPair = decode_json(response).await?;
        tracing::debug!("token refresh succeeded");
        Ok(pair)
    }
}
