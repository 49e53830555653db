//! Session-scoped key/value storage and External Files Maps
//!
//! A multi-file ROM bundle is published to the emulator as an External Files
//! Map (file name -> blob reference) stored as JSON under
//! `<prefix><token>`. The emulator only ever sees the token.

use nr_core::error::StorageError;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// File name -> blob reference table of one bundle
pub type ExternalFilesMap = BTreeMap<String, String>;

/// Key/value storage scoped to one session
pub trait SessionStorage: Send + Sync {
    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn get_item(&self, key: &str) -> Option<String>;
    fn remove_item(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// In-memory [`SessionStorage`] with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys and values exceed `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut items = self.items.write();

        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        items.insert(key.to_string(), value);
        Ok(())
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn remove_item(&self, key: &str) {
        self.items.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a collision-resistant lookup token.
///
/// A random v4 UUID from the OS generator when available, otherwise
/// [`fallback_token`].
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(e) => {
            tracing::warn!("OS random source unavailable ({}), using fallback token", e);
            fallback_token()
        }
    }
}

/// Timestamp plus pseudo-random suffix, for when no secure source exists
pub fn fallback_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let sequence = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

    // splitmix64 over the timestamp and a process-wide sequence number
    let mut z = millis
        .wrapping_add(sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;

    format!("{}-{:x}", millis, z)
}

/// Persists External Files Maps under namespaced keys
#[derive(Clone)]
pub struct ExternalFilesStore {
    storage: Arc<dyn SessionStorage>,
    prefix: String,
}

impl ExternalFilesStore {
    pub fn new(storage: Arc<dyn SessionStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// Storage key for `token`
    pub fn storage_key(&self, token: &str) -> String {
        format!("{}{}", self.prefix, token)
    }

    /// Store `map` under a fresh token and return the token
    pub fn persist(&self, map: &ExternalFilesMap) -> Result<String, StorageError> {
        let value =
            serde_json::to_string(map).map_err(|e| StorageError::Serialize(e.to_string()))?;
        let token = generate_token();
        self.storage.set_item(&self.storage_key(&token), value)?;
        tracing::debug!("Persisted external files map {} ({} entries)", token, map.len());
        Ok(token)
    }

    /// Read back the map stored under `token`
    pub fn load(&self, token: &str) -> Option<ExternalFilesMap> {
        let value = self.storage.get_item(&self.storage_key(token))?;
        serde_json::from_str(&value).ok()
    }

    /// Remove the map stored under `token`, if any
    pub fn clear(&self, token: Option<&str>) {
        if let Some(token) = token {
            self.storage.remove_item(&self.storage_key(token));
            tracing::debug!("Cleared external files map {}", token);
        }
    }
}
