//! Device identity
//!
//! Every request carries an `x-device-id` header naming this installation. The
//! identifier is generated lazily on first use and kept in storage until the
//! storage is cleared.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::Arc;

use crate::client::http::is_header_safe;
use crate::client::storage::{KeyValueStore, DEVICE_ID_KEY};
use crate::shared::error::StorageError;

/// Request header carrying the device identifier
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Accessor for the persisted device identifier
#[derive(Clone)]
pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Return the device identifier, generating and persisting one if needed.
    ///
    /// Never fails. If the new identifier cannot be persisted it is still
    /// returned for this call. A stored value that cannot be sent as a header
    /// is replaced.
    pub fn device_id(&self) -> String {
        if let Some(id) = self.store.get(DEVICE_ID_KEY).filter(|id| !id.is_empty()) {
            if is_header_safe(&id) {
                return id;
            }
            tracing::warn!("stored device id cannot be sent as a header, replacing it");
        }

        let id = generate_device_id();
        match self.store.set(DEVICE_ID_KEY, &id) {
            Ok(()) => tracing::info!(device_id = %id, "generated new device id"),
            Err(e) => tracing::warn!("failed to persist device id: {}", e),
        }
        id
    }

    /// Adopt an identifier issued elsewhere (OAuth handoff).
    ///
    /// Empty identifiers and ones that cannot be sent as a header are ignored.
    pub fn adopt(&self, id: &str) -> Result<(), StorageError> {
        if id.is_empty() {
            return Ok(());
        }
        if !is_header_safe(id) {
            tracing::warn!("ignoring device id that cannot be sent as a header");
            return Ok(());
        }
        self.store.set(DEVICE_ID_KEY, id)
    }
}

/// Random UUID v4 from the OS source, or `<unix millis><hex>` if the OS source
/// is unavailable.
pub fn generate_device_id() -> String {
    let mut bytes = [0u8; 16];
    match getrandom::fill(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(e) => {
            tracing::warn!("secure random source unavailable, using fallback device id: {}", e);
            fallback_device_id()
        }
    }
}

fn fallback_device_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_i64(millis);
    hasher.write_u32(std::process::id());
    format!("{}{:013x}", millis, hasher.finish() & 0x000f_ffff_ffff_ffff)
}
