//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A wiremock-backed fake of the LeadHub backend
//! - Session seeding helpers
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod mock_backend;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use mock_backend::*;
