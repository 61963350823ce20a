//! Shared Module
//!
//! Types and data structures shared by the client library and the CLI: the
//! payloads exchanged with the backend, error types and configuration.
//!
//! All payload types are plain serde structs matching the backend's JSON.

/// Authentication payloads
pub mod auth;

/// Lead, analytics and report payloads
pub mod leads;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use auth::{MeResponse, TokenPair, UserCreate, UserResponse, UserRole};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::{ClientError, StorageError};
pub use leads::{DashboardMetrics, Lead, LeadCreate, ReportKind};
