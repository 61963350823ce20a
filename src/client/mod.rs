//! API Client Module
//!
//! Everything that talks to the LeadHub backend from the client side.
//!
//! # Architecture
//!
//! - **`storage`** - Key-value store the session state lives in
//! - **`device`** - Persisted device identifier sent with every request
//! - **`credentials`** - Access/refresh token pair
//! - **`refresh`** - Token refresh call
//! - **`pipeline`** - `ApiClient` and the authenticated request wrapper
//! - **`auth`** - Login, logout, OAuth handoff, account flows
//! - **`api`** - Typed lead/analytics/report endpoints
//! - **`config`** - Environment-backed configuration
//! - **`http`** - Request options and response helpers
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── config.rs       - Configuration management
//! ├── storage.rs      - MemoryStore / FileStore
//! ├── device.rs       - Device identity
//! ├── credentials.rs  - Credential store
//! ├── refresh.rs      - Token refresh client
//! ├── http.rs         - RequestOptions, header building, decoding
//! ├── pipeline.rs     - ApiClient::authed_fetch
//! ├── auth.rs         - Login/logout and account flows
//! └── api.rs          - Typed endpoints
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod device;
pub mod http;
pub mod pipeline;
pub mod refresh;
pub mod storage;

// Re-export commonly used types
pub use auth::{describe_failure, OAuthHandoff};
pub use config::Config;
pub use credentials::CredentialStore;
pub use device::{DeviceIdentity, DEVICE_ID_HEADER};
pub use http::RequestOptions;
pub use pipeline::ApiClient;
pub use refresh::TokenRefresher;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
