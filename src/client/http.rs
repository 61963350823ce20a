//! Request options and response helpers shared by the pipeline and the typed
//! API.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::device::DEVICE_ID_HEADER;
use crate::shared::error::ClientError;

/// One outbound call as described by the caller.
///
/// The body is held as bytes so the exact same payload can be replayed when
/// the request is retried after a refresh.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Bounds each attempt, not the refresh in between
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::invalid_header(name))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::invalid_header(name.as_str()))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Serialize `payload` as the JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self, ClientError> {
        let bytes = serde_json::to_vec(payload)
            .map_err(|e| ClientError::decode(format!("failed to encode request body: {}", e)))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Form-encode `fields` as the body
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let encoded = encode_form(fields);
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self.body = Some(Bytes::from(encoded));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// `application/x-www-form-urlencoded` body text
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

/// Caller headers plus the device id and, when present, the bearer token.
pub fn build_headers(
    original: &HeaderMap,
    device_id: &str,
    access_token: &str,
) -> Result<HeaderMap, ClientError> {
    let mut headers = original.clone();
    let device = HeaderValue::from_str(device_id)
        .map_err(|_| ClientError::invalid_header(DEVICE_ID_HEADER))?;
    headers.insert(HeaderName::from_static(DEVICE_ID_HEADER), device);

    if !access_token.is_empty() {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| ClientError::invalid_header(AUTHORIZATION.as_str()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
    }

    Ok(headers)
}

/// Whether `value` can be sent as a header value
pub fn is_header_safe(value: &str) -> bool {
    HeaderValue::from_str(value).is_ok()
}

/// Parse a response body as JSON
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::from)
}

/// Pass successful responses through; turn the rest into `ClientError::Http`
/// carrying the backend's `detail` string, or `fallback` when there is none.
pub async fn expect_success(response: Response, fallback: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| fallback.to_string());
    tracing::debug!(status = status.as_u16(), %message, "request failed");
    Err(ClientError::http(status.as_u16(), message))
}

/// `detail` field of a FastAPI-style error body, when it is a plain string
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
