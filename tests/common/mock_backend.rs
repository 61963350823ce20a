//! Mock backend helpers for integration tests
//!
//! Wraps a wiremock server with a client pointed at it.

use std::sync::Arc;

use leadhub::client::{ApiClient, Config, MemoryStore};
use leadhub::shared::config::AppConfig;
use wiremock::{Match, MockServer, Request};

pub const LEADS_PATH: &str = "/api/v1/leads";
pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// A fake backend and a client bound to it
pub struct TestBackend {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub client: ApiClient,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let client = client_for(&server.uri(), store.clone());
        Self {
            server,
            store,
            client,
        }
    }

    /// Requests the server received for `path`, in arrival order
    pub async fn requests_to(&self, path: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }
}

/// Client for `base` over `store`
pub fn client_for(base: &str, store: Arc<MemoryStore>) -> ApiClient {
    let config = Config::with_builder(AppConfig::builder().api_base(base).request_timeout_secs(5))
        .expect("valid test config");
    ApiClient::new(config, store).expect("client")
}

/// Matches requests that carry no `Authorization` header
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

/// Header value of `request` as a string
pub fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
