//! LeadHub - Client Library
//!
//! LeadHub is a lead management service for real-estate agencies. This crate
//! is its client tier: the authenticated request pipeline every dashboard call
//! goes through, a typed API over the backend endpoints, and the `leadhub`
//! command-line front end.
//!
//! # Overview
//!
//! - Device identity sent with every request (`x-device-id`)
//! - Access/refresh token pair persisted in a local key-value store
//! - Transparent single refresh-and-retry on `401 Unauthorized`
//! - Login, logout and OAuth callback handoff
//! - Typed calls for leads, analytics, integrations, appointments and reports
//!
//! # Module Structure
//!
//! - **`shared`** - Payload types, error types, file configuration
//! - **`client`** - Storage, credentials, request pipeline, typed API
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use leadhub::client::{ApiClient, Config, FileStore};
//!
//! # async fn example() -> Result<(), leadhub::shared::error::ClientError> {
//! let config = Config::new();
//! let store = Arc::new(FileStore::open(config.storage_path())?);
//! let client = ApiClient::new(config, store)?;
//!
//! client.login("admin@agency.com", "admin123").await?;
//! for lead in client.fetch_leads().await? {
//!     println!("{} {}", lead.id, lead.full_name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every fallible call returns `Result<T, ClientError>`. Authentication
//! failures (`NoRefreshToken`, `SessionExpired`) are distinguishable through
//! [`shared::error::ClientError::is_auth_error`] so callers can send the user
//! back to the login screen instead of reporting a failed operation.
//!
//! # Thread Safety
//!
//! `ApiClient` is `Clone + Send + Sync`; clones share the same store and the
//! same refresh guard.

/// Shared types and data structures
pub mod shared;

/// Backend API client
pub mod client;
