//! Authentication Module
//!
//! Login, logout, the OAuth fragment handoff and the account flows that run
//! before a session exists (registration, password reset).

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::client::device::DEVICE_ID_HEADER;
use crate::client::http::{decode_json, encode_form, expect_success, is_header_safe, RequestOptions};
use crate::client::pipeline::ApiClient;
use crate::shared::auth::{
    ForgotPasswordRequest, MeResponse, ResetPasswordRequest, TokenPair, UserCreate, UserResponse,
};
use crate::shared::error::ClientError;

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const ME_PATH: &str = "/api/v1/auth/me";
pub const FORGOT_PASSWORD_PATH: &str = "/api/v1/password/forgot";
pub const RESET_PASSWORD_PATH: &str = "/api/v1/password/reset";

/// Where to go after an OAuth handoff that names no target
pub const DEFAULT_HANDOFF_TARGET: &str = "/app/dashboard";

/// Values carried in an OAuth callback fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthHandoff {
    pub tokens: Option<TokenPair>,
    pub device_id: Option<String>,
    pub next: String,
}

impl OAuthHandoff {
    /// Parse `#access_token=..&refresh_token=..&device_id=..&next=..`.
    ///
    /// Returns `NotAHandoff` when the fragment has no `access_token` at all.
    /// Tokens are only taken as a pair; a fragment with one of them yields
    /// `tokens: None`. Values that cannot be sent as header values are
    /// dropped.
    pub fn parse(fragment: &str) -> Result<Self, ClientError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

        let mut access = None;
        let mut refresh = None;
        let mut device_id = None;
        let mut next = None;
        let mut saw_access = false;

        for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "access_token" => {
                    saw_access = true;
                    access = sendable("access_token", value);
                }
                "refresh_token" => refresh = sendable("refresh_token", value),
                "device_id" => device_id = sendable("device_id", value),
                "next" => next = Some(value).filter(|v| !v.is_empty()),
                _ => {}
            }
        }

        if !saw_access {
            return Err(ClientError::NotAHandoff);
        }

        let tokens = match (access, refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        };

        Ok(Self {
            tokens,
            device_id,
            next: next.unwrap_or_else(|| DEFAULT_HANDOFF_TARGET.to_string()),
        })
    }
}

/// `value` if it is non-empty and can travel in a request header.
///
/// Stored tokens and device ids end up in `Authorization` and `x-device-id`;
/// keeping one that cannot be sent would break every later request.
fn sendable(field: &'static str, value: String) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if !is_header_safe(&value) {
        tracing::warn!(field, "ignoring OAuth callback value that cannot be sent as a header");
        return None;
    }
    Some(value)
}

impl ApiClient {
    /// Exchange credentials for a token pair without storing it.
    pub async fn request_login_tokens(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, ClientError> {
        let response = self
            .http
            .post(self.config.api_url(LOGIN_PATH))
            .header(DEVICE_ID_HEADER, self.device.device_id())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_form(&[("username", email), ("password", password)]))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "login rejected");
            return Err(ClientError::InvalidCredentials {
                status: status.as_u16(),
            });
        }

        decode_json(response).await
    }

    /// Log in and persist the resulting token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ClientError> {
        let pair = self.request_login_tokens(email, password).await?;
        self.credentials.set_tokens(&pair)?;
        tracing::info!("logged in");
        Ok(pair)
    }

    /// Forget the local session. The backend is not contacted.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.credentials.clear_tokens()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Whether a session is stored locally
    pub fn has_session(&self) -> bool {
        self.credentials.has_session()
    }

    /// Store the tokens (and device id) delivered in an OAuth callback fragment
    /// and return the page to continue to.
    pub fn accept_oauth_handoff(&self, fragment: &str) -> Result<String, ClientError> {
        let handoff = OAuthHandoff::parse(fragment)?;

        match &handoff.tokens {
            Some(pair) => {
                self.credentials.set_tokens(pair)?;
                tracing::info!("session received from OAuth callback");
            }
            None => tracing::warn!("OAuth callback fragment carried an incomplete token pair"),
        }
        if let Some(device_id) = &handoff.device_id {
            self.device.adopt(device_id)?;
        }

        Ok(handoff.next)
    }

    /// Current account, or `None` when the backend does not return one.
    pub async fn me(&self) -> Result<Option<MeResponse>, ClientError> {
        let response = self.authed_fetch(ME_PATH, RequestOptions::get()).await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        decode_json(response).await.map(Some)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, payload: &UserCreate) -> Result<UserResponse, ClientError> {
        let response = self
            .http
            .post(self.config.api_url(REGISTER_PATH))
            .json(payload)
            .send()
            .await?;
        let response = expect_success(response, "Registration failed").await?;
        decode_json(response).await
    }

    /// Ask for a password reset link.
    ///
    /// Only transport errors are reported; whether the address exists never
    /// reaches the caller.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.config.api_url(FORGOT_PASSWORD_PATH))
            .json(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::debug!(
                status = response.status().as_u16(),
                "password reset request not accepted"
            );
        }
        Ok(())
    }

    /// Set a new password using the token from a reset link.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.config.api_url(RESET_PASSWORD_PATH))
            .json(&ResetPasswordRequest {
                token: token.trim().to_string(),
                new_password: new_password.to_string(),
            })
            .send()
            .await?;

        expect_success(response, "Reset failed").await?;
        Ok(())
    }
}

/// Message to show when a protected page could not load
pub fn describe_failure(error: &ClientError) -> String {
    match error {
        e if e.is_auth_error() => "Login required (or API not ready).".to_string(),
        ClientError::Http { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16() => {
            "Login required (or API not ready).".to_string()
        }
        other => other.to_string(),
    }
}
