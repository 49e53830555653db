//! Ownership of ROM and BIOS resources
//!
//! The tracker holds the single current generation of custom ROM blobs (plus
//! its External Files Map) and the single current BIOS blob. Replacing a
//! slot releases the old generation before the new one is adopted, and
//! dropping the tracker releases everything.

use crate::blob::BlobStore;
use crate::storage::ExternalFilesStore;
use tracing::debug;

pub struct ResourceTracker {
    blobs: BlobStore,
    external: ExternalFilesStore,
    rom_blobs: Vec<String>,
    rom_token: Option<String>,
    bios_blob: Option<String>,
}

impl ResourceTracker {
    pub fn new(blobs: BlobStore, external: ExternalFilesStore) -> Self {
        Self {
            blobs,
            external,
            rom_blobs: Vec::new(),
            rom_token: None,
            bios_blob: None,
        }
    }

    /// Release the current ROM generation, then adopt `blobs` and `token`
    pub fn replace_custom_rom_artifacts(&mut self, blobs: Vec<String>, token: Option<String>) {
        self.release_rom();
        debug!(
            "Tracking {} ROM blob(s), external files token {:?}",
            blobs.len(),
            token
        );
        self.rom_blobs = blobs;
        self.rom_token = token;
    }

    /// Release the current BIOS blob, then adopt `blob`
    pub fn replace_bios_blob(&mut self, blob: Option<String>) {
        if let Some(old) = self.bios_blob.take() {
            self.blobs.revoke(&old);
        }
        self.bios_blob = blob;
    }

    /// Release everything tracked. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.release_rom();
        self.replace_bios_blob(None);
    }

    pub fn rom_blobs(&self) -> &[String] {
        &self.rom_blobs
    }

    pub fn rom_token(&self) -> Option<&str> {
        self.rom_token.as_deref()
    }

    fn release_rom(&mut self) {
        let blobs = std::mem::take(&mut self.rom_blobs);
        self.blobs.revoke_all(&blobs);
        self.external.clear(self.rom_token.take().as_deref());
    }
}

impl Drop for ResourceTracker {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ExternalFilesMap, MemoryStorage};
    use std::sync::Arc;

    struct Fixture {
        blobs: BlobStore,
        external: ExternalFilesStore,
        storage: Arc<MemoryStorage>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        Fixture {
            blobs: BlobStore::new(),
            external: ExternalFilesStore::new(storage.clone(), "test:"),
            storage,
        }
    }

    fn generation(f: &Fixture, count: usize) -> (Vec<String>, String) {
        let refs: Vec<String> = (0..count)
            .map(|i| f.blobs.create(vec![i as u8], "application/octet-stream"))
            .collect();
        let map: ExternalFilesMap = refs
            .iter()
            .enumerate()
            .map(|(i, r)| (format!("track{}.bin", i), r.clone()))
            .collect();
        let token = f.external.persist(&map).unwrap();
        (refs, token)
    }

    #[test]
    fn test_replace_releases_previous_generation() {
        let f = fixture();
        let mut tracker = ResourceTracker::new(f.blobs.clone(), f.external.clone());

        let (first, first_token) = generation(&f, 3);
        tracker.replace_custom_rom_artifacts(first.clone(), Some(first_token.clone()));
        assert_eq!(f.blobs.live_count(), 3);

        let (second, second_token) = generation(&f, 2);
        tracker.replace_custom_rom_artifacts(second.clone(), Some(second_token.clone()));

        assert!(first.iter().all(|r| !f.blobs.contains(r)));
        assert!(f.external.load(&first_token).is_none());
        assert!(second.iter().all(|r| f.blobs.contains(r)));
        assert!(f.external.load(&second_token).is_some());
        assert_eq!(tracker.rom_token(), Some(second_token.as_str()));
    }

    #[test]
    fn test_single_file_generation_has_no_token() {
        let f = fixture();
        let mut tracker = ResourceTracker::new(f.blobs.clone(), f.external.clone());

        let (cue_set, token) = generation(&f, 2);
        tracker.replace_custom_rom_artifacts(cue_set, Some(token));

        let single = f.blobs.create(vec![1u8], "application/octet-stream");
        tracker.replace_custom_rom_artifacts(vec![single.clone()], None);
        assert_eq!(f.blobs.live_count(), 1);
        assert!(f.storage.is_empty());
        assert_eq!(tracker.rom_blobs(), &[single]);
    }

    #[test]
    fn test_bios_slot_is_independent() {
        let f = fixture();
        let mut tracker = ResourceTracker::new(f.blobs.clone(), f.external.clone());

        let rom = f.blobs.create(vec![1u8], "application/octet-stream");
        tracker.replace_custom_rom_artifacts(vec![rom.clone()], None);

        let bios_a = f.blobs.create(vec![2u8], "application/octet-stream");
        tracker.replace_bios_blob(Some(bios_a.clone()));
        let bios_b = f.blobs.create(vec![3u8], "application/octet-stream");
        tracker.replace_bios_blob(Some(bios_b.clone()));

        assert!(!f.blobs.contains(&bios_a));
        assert!(f.blobs.contains(&bios_b));
        assert!(f.blobs.contains(&rom));
    }

    #[test]
    fn test_plain_urls_are_tolerated() {
        let f = fixture();
        let mut tracker = ResourceTracker::new(f.blobs.clone(), f.external.clone());
        tracker.replace_bios_blob(Some("/bios/openbios.bin".to_string()));
        tracker.replace_custom_rom_artifacts(vec!["https://example.com/a.chd".into()], None);
        tracker.teardown();
    }

    #[test]
    fn test_teardown_is_idempotent_and_runs_on_drop() {
        let f = fixture();
        {
            let mut tracker = ResourceTracker::new(f.blobs.clone(), f.external.clone());
            tracker.teardown();

            let (refs, token) = generation(&f, 2);
            tracker.replace_custom_rom_artifacts(refs, Some(token));
            let bios = f.blobs.create(vec![0u8], "application/octet-stream");
            tracker.replace_bios_blob(Some(bios));
            assert_eq!(f.blobs.live_count(), 3);
        }
        assert_eq!(f.blobs.live_count(), 0);
        assert!(f.storage.is_empty());
    }
}
