//! Credential store: the persisted access/refresh token pair.

use std::sync::Arc;

use crate::client::storage::{KeyValueStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::shared::auth::TokenPair;
use crate::shared::error::StorageError;

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current access token, empty when unset
    pub fn access_token(&self) -> String {
        self.store.get(ACCESS_TOKEN_KEY).unwrap_or_default()
    }

    /// Current refresh token, empty when unset
    pub fn refresh_token(&self) -> String {
        self.store.get(REFRESH_TOKEN_KEY).unwrap_or_default()
    }

    /// Replace both tokens in one write
    pub fn set_tokens(&self, pair: &TokenPair) -> Result<(), StorageError> {
        self.store.set_many(&[
            (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
        ])
    }

    /// Remove both tokens
    pub fn clear_tokens(&self) -> Result<(), StorageError> {
        self.store.delete_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
    }

    /// Whether anything worth logging out of is stored
    pub fn has_session(&self) -> bool {
        !self.access_token().is_empty() || !self.refresh_token().is_empty()
    }
}
