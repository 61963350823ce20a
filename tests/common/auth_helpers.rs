//! Authentication test helpers
//!
//! Seeding and inspecting the stored session.

use leadhub::client::KeyValueStore;
use serde_json::{json, Value};

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Backend body for a login/refresh success
pub fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer"
    })
}

/// Put a token pair straight into `store`
pub fn seed_session(store: &dyn KeyValueStore, access: &str, refresh: &str) {
    store
        .set_many(&[("token", access), ("refresh_token", refresh)])
        .expect("seed session");
}

/// `(token, refresh_token)` as stored
pub fn stored_pair(store: &dyn KeyValueStore) -> (Option<String>, Option<String>) {
    (store.get("token"), store.get("refresh_token"))
}
