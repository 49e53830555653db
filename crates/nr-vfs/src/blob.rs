//! In-memory blob registry
//!
//! Blobs are opaque, revocable handles to byte content. A blob reference is a
//! string starting with `blob:`; anything else (a site path, a remote URL)
//! is a plain reference that the registry never owns.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Prefix shared by every blob reference
pub const BLOB_SCHEME: &str = "blob:";

/// Check whether `reference` points at blob-backed content
pub fn is_blob_ref(reference: &str) -> bool {
    reference.starts_with(BLOB_SCHEME)
}

/// A registered blob
#[derive(Debug, Clone)]
pub struct Blob {
    pub data: Arc<[u8]>,
    pub mime: String,
}

#[derive(Debug, Default)]
struct Registry {
    blobs: HashMap<String, Blob>,
    next_id: u64,
}

/// Shared blob registry
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    registry: Arc<RwLock<Registry>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return its reference
    pub fn create(&self, data: impl Into<Arc<[u8]>>, mime: &str) -> String {
        let data = data.into();
        let mut registry = self.registry.write();
        registry.next_id += 1;
        let reference = format!("{}nostalgia/{:08x}", BLOB_SCHEME, registry.next_id);

        tracing::debug!("Created {} ({} bytes, {})", reference, data.len(), mime);
        registry.blobs.insert(
            reference.clone(),
            Blob {
                data,
                mime: mime.to_string(),
            },
        );
        reference
    }

    /// Look up the blob behind `reference`
    pub fn resolve(&self, reference: &str) -> Option<Blob> {
        self.registry.read().blobs.get(reference).cloned()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.registry.read().blobs.contains_key(reference)
    }

    /// Release `reference`.
    ///
    /// Non-blob references and already revoked blobs are ignored. Returns
    /// whether a blob was actually released.
    pub fn revoke(&self, reference: &str) -> bool {
        if !is_blob_ref(reference) {
            return false;
        }
        let removed = self.registry.write().blobs.remove(reference).is_some();
        if removed {
            tracing::debug!("Revoked {}", reference);
        }
        removed
    }

    pub fn revoke_all<S: AsRef<str>>(&self, references: &[S]) {
        for reference in references {
            self.revoke(reference.as_ref());
        }
    }

    /// Number of blobs currently alive
    pub fn live_count(&self) -> usize {
        self.registry.read().blobs.len()
    }
}
