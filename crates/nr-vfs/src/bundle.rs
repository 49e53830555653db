//! ROM bundling
//!
//! Turns a loose file selection into something the emulator can boot:
//! either a cue sheet plus its track files published through an External
//! Files Map, or a single best-guess image file.

use crate::blob::BlobStore;
use crate::file::{base_name, SelectedFile};
use crate::formats::cue::{file_references, rewrite_file_lines};
use crate::storage::{ExternalFilesMap, ExternalFilesStore};
use nr_core::error::BundleError;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Single-file extensions in order of preference
pub const ROM_EXT_PRIORITY: [&str; 6] = [".chd", ".pbp", ".iso", ".ccd", ".bin", ".img"];

const CUE_MIME: &str = "text/plain";
const DATA_MIME: &str = "application/octet-stream";

/// A cue sheet bundle ready to boot
#[derive(Debug, Clone)]
pub struct CueBundle {
    /// Lookup token of the persisted External Files Map
    pub token: String,
    /// Blob holding the rewritten cue sheet
    pub cue_blob: String,
    /// One blob per track file, in order of first reference
    pub data_blobs: Vec<String>,
    /// Name of the cue file as selected
    pub title: String,
    pub hint: String,
    /// Map entry the emulator should open first
    pub entry_file_name: String,
}

impl CueBundle {
    /// Every blob owned by this bundle
    pub fn blob_refs(&self) -> Vec<String> {
        std::iter::once(self.cue_blob.clone())
            .chain(self.data_blobs.iter().cloned())
            .collect()
    }

    pub fn track_count(&self) -> usize {
        self.data_blobs.len()
    }
}

/// A single image file ready to boot
#[derive(Debug, Clone)]
pub struct SingleRom {
    pub blob: String,
    pub file_name: String,
}

/// Blobs created during one bundling attempt.
///
/// Everything still held on drop is revoked, so any early return rolls the
/// attempt back.
struct PendingBlobs<'a> {
    blobs: &'a BlobStore,
    refs: Vec<String>,
}

impl<'a> PendingBlobs<'a> {
    fn new(blobs: &'a BlobStore) -> Self {
        Self {
            blobs,
            refs: Vec::new(),
        }
    }

    fn create(&mut self, file: &SelectedFile, mime: &str) -> Result<String, BundleError> {
        let data = file.read().map_err(|source| BundleError::Read {
            name: file.name().to_string(),
            source,
        })?;
        let reference = self.blobs.create(data, mime);
        self.refs.push(reference.clone());
        Ok(reference)
    }

    fn create_text(&mut self, text: String, mime: &str) -> String {
        let reference = self.blobs.create(text.into_bytes(), mime);
        self.refs.push(reference.clone());
        reference
    }

    /// Keep every blob created so far
    fn commit(mut self) {
        self.refs.clear();
    }
}

impl Drop for PendingBlobs<'_> {
    fn drop(&mut self) {
        if !self.refs.is_empty() {
            debug!("Rolling back {} blobs", self.refs.len());
            self.blobs.revoke_all(&self.refs);
        }
    }
}

/// First `.cue` file in the selection
pub fn find_cue(files: &[SelectedFile]) -> Option<&SelectedFile> {
    files.iter().find(|file| file.extension() == ".cue")
}

/// Best single file by [`ROM_EXT_PRIORITY`], else the first file
pub fn pick_rom_file(files: &[SelectedFile]) -> Option<&SelectedFile> {
    ROM_EXT_PRIORITY
        .iter()
        .find_map(|ext| files.iter().find(|file| file.extension() == *ext))
        .or_else(|| files.first())
}

/// Builds bundles into a blob registry and an External Files store
#[derive(Clone)]
pub struct RomBundler {
    blobs: BlobStore,
    external: ExternalFilesStore,
}

impl RomBundler {
    pub fn new(blobs: BlobStore, external: ExternalFilesStore) -> Self {
        Self { blobs, external }
    }

    /// Bundle `cue` with the track files it references from `files`.
    ///
    /// References are matched on lower-cased base name only. Any missing
    /// reference fails the whole bundle. On failure no blob or storage
    /// entry created by this call survives.
    pub fn build_cue_bundle(
        &self,
        files: &[SelectedFile],
        cue: &SelectedFile,
    ) -> Result<CueBundle, BundleError> {
        let cue_text = cue.text().map_err(|source| BundleError::Read {
            name: cue.name().to_string(),
            source,
        })?;

        let by_name: HashMap<String, usize> = files
            .iter()
            .enumerate()
            .map(|(index, file)| (file.base_name().to_lowercase(), index))
            .collect();

        let lookup = |path: &str| by_name.get(&base_name(path).to_lowercase()).copied();

        let mut used: Vec<usize> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        for line in file_references(&cue_text) {
            match lookup(line.path) {
                Some(index) if !used.contains(&index) => used.push(index),
                Some(_) => {}
                None if !missing.iter().any(|m| m == line.path) => {
                    missing.push(line.path.to_string())
                }
                None => {}
            }
        }

        if !missing.is_empty() {
            warn!("Cue sheet {} references missing files: {:?}", cue.name(), missing);
            return Err(BundleError::MissingReferences(missing));
        }
        if used.is_empty() {
            return Err(BundleError::NoValidTracks);
        }

        let rewritten = rewrite_file_lines(&cue_text, |line| {
            lookup(line.path).map(|index| files[index].clean_name())
        });

        let mut pending = PendingBlobs::new(&self.blobs);
        let cue_blob = pending.create_text(rewritten, CUE_MIME);
        let entry_file_name = cue.clean_name();

        let mut map = ExternalFilesMap::new();
        map.insert(entry_file_name.clone(), cue_blob.clone());

        let mut data_blobs = Vec::with_capacity(used.len());
        for &index in &used {
            let file = &files[index];
            let reference = pending.create(file, DATA_MIME)?;
            map.insert(file.clean_name(), reference.clone());
            data_blobs.push(reference);
        }

        let token = self.external.persist(&map).map_err(BundleError::Persist)?;
        pending.commit();

        info!(
            "Bundled {} with {} track file(s) as {}",
            cue.name(),
            data_blobs.len(),
            token
        );

        Ok(CueBundle {
            hint: format!(
                "Loaded CUE/BIN set: {} ({} track file/s).",
                cue.name(),
                data_blobs.len()
            ),
            title: cue.name().to_string(),
            token,
            cue_blob,
            data_blobs,
            entry_file_name,
        })
    }

    /// Pack the best single image from `files` into one blob.
    ///
    /// Fails when the selection is empty or when the best candidate is a
    /// cue sheet, which cannot boot without its tracks.
    pub fn pack_single_file(&self, files: &[SelectedFile]) -> Result<SingleRom, BundleError> {
        let file = pick_rom_file(files).ok_or(BundleError::EmptySelection)?;
        if file.extension() == ".cue" {
            return Err(BundleError::LoneCue);
        }

        let mut pending = PendingBlobs::new(&self.blobs);
        let blob = pending.create(file, DATA_MIME)?;
        pending.commit();

        info!("Packed single ROM file {}", file.name());
        Ok(SingleRom {
            blob,
            file_name: file.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    const PREFIX: &str = "nostalgia:external-files:";

    fn bundler_with(storage: Arc<MemoryStorage>) -> (RomBundler, BlobStore) {
        let blobs = BlobStore::new();
        let external = ExternalFilesStore::new(storage, PREFIX);
        (RomBundler::new(blobs.clone(), external), blobs)
    }

    fn two_track_cue() -> SelectedFile {
        SelectedFile::from_bytes(
            "game.cue",
            b"FILE \"track1.bin\" BINARY\n  TRACK 01 MODE2/2352\n    INDEX 01 00:00:00\nFILE \"track2.bin\" BINARY\n  TRACK 02 AUDIO\n    INDEX 01 00:00:00\n"
                .to_vec(),
        )
    }

    #[test]
    fn test_two_track_bundle() {
        let storage = Arc::new(MemoryStorage::new());
        let (bundler, blobs) = bundler_with(storage.clone());
        let files = vec![
            two_track_cue(),
            SelectedFile::from_bytes("track1.bin", vec![1u8; 32]),
            SelectedFile::from_bytes("track2.bin", vec![2u8; 32]),
        ];

        let bundle = bundler.build_cue_bundle(&files, &files[0]).unwrap();
        assert_eq!(bundle.track_count(), 2);
        assert!(bundle.hint.contains('2'));
        assert_eq!(bundle.entry_file_name, "game.cue");
        assert_eq!(blobs.live_count(), 3);

        let external = ExternalFilesStore::new(storage, PREFIX);
        let map = external.load(&bundle.token).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map["game.cue"], bundle.cue_blob);
        assert_eq!(&*blobs.resolve(&map["track2.bin"]).unwrap().data, &[2u8; 32][..]);
    }

    #[test]
    fn test_references_match_by_base_name_case_insensitive() {
        let (bundler, blobs) = bundler_with(Arc::new(MemoryStorage::new()));
        let cue = SelectedFile::from_bytes(
            "Disc.cue",
            b"file \"C:\\Rips\\DISC (Track 1).BIN\" binary\r\n  TRACK 01 MODE2/2352\r\n".to_vec(),
        );
        let files = vec![
            cue.clone(),
            SelectedFile::from_bytes("disc (track 1).bin", vec![7u8; 4]),
        ];

        let bundle = bundler.build_cue_bundle(&files, &cue).unwrap();
        let rewritten = blobs.resolve(&bundle.cue_blob).unwrap();
        assert_eq!(
            String::from_utf8_lossy(&rewritten.data),
            "FILE \"disc (track 1).bin\" binary\r\n  TRACK 01 MODE2/2352\r\n"
        );
    }

    #[test]
    fn test_repeated_reference_counts_once() {
        let (bundler, _) = bundler_with(Arc::new(MemoryStorage::new()));
        let cue = SelectedFile::from_bytes(
            "game.cue",
            b"FILE \"game.bin\" BINARY\nFILE \"GAME.BIN\" BINARY\n".to_vec(),
        );
        let files = vec![cue.clone(), SelectedFile::from_bytes("game.bin", vec![0u8])];

        let bundle = bundler.build_cue_bundle(&files, &cue).unwrap();
        assert_eq!(bundle.track_count(), 1);
    }

    #[test]
    fn test_missing_reference_fails_without_leftovers() {
        let storage = Arc::new(MemoryStorage::new());
        let (bundler, blobs) = bundler_with(storage.clone());
        let cue = SelectedFile::from_bytes(
            "game.cue",
            b"FILE \"track1.bin\" BINARY\nFILE \"missing.bin\" BINARY\n".to_vec(),
        );
        let files = vec![cue.clone(), SelectedFile::from_bytes("track1.bin", vec![1u8])];

        let err = bundler.build_cue_bundle(&files, &cue).unwrap_err();
        assert!(matches!(err, BundleError::MissingReferences(_)));
        assert!(err.to_string().contains("missing.bin"));
        assert_eq!(blobs.live_count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_no_file_lines_fails_distinctly() {
        let (bundler, blobs) = bundler_with(Arc::new(MemoryStorage::new()));
        let cue = SelectedFile::from_bytes("empty.cue", b"REM nothing here\n".to_vec());

        let err = bundler.build_cue_bundle(&[cue.clone()], &cue).unwrap_err();
        assert!(matches!(err, BundleError::NoValidTracks));
        assert!(err.to_string().contains("no valid FILE tracks"));
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn test_storage_failure_rolls_back_blobs() {
        let storage = Arc::new(MemoryStorage::with_quota(8));
        let (bundler, blobs) = bundler_with(storage.clone());
        let files = vec![
            two_track_cue(),
            SelectedFile::from_bytes("track1.bin", vec![1u8; 32]),
            SelectedFile::from_bytes("track2.bin", vec![2u8; 32]),
        ];

        let err = bundler.build_cue_bundle(&files, &files[0]).unwrap_err();
        assert!(matches!(err, BundleError::Persist(_)));
        assert_eq!(blobs.live_count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_pick_prefers_chd_over_bin() {
        let files = vec![
            SelectedFile::from_bytes("game.bin", Vec::<u8>::new()),
            SelectedFile::from_bytes("game.cue", Vec::<u8>::new()),
            SelectedFile::from_bytes("game.CHD", Vec::<u8>::new()),
        ];
        assert_eq!(pick_rom_file(&files).unwrap().name(), "game.CHD");
    }

    #[test]
    fn test_pick_defaults_to_first_file() {
        let files = vec![
            SelectedFile::from_bytes("game.exe", Vec::<u8>::new()),
            SelectedFile::from_bytes("notes.txt", Vec::<u8>::new()),
        ];
        assert_eq!(pick_rom_file(&files).unwrap().name(), "game.exe");
        assert!(pick_rom_file(&[]).is_none());
    }

    #[test]
    fn test_pack_single_file_rejects_lone_cue() {
        let (bundler, blobs) = bundler_with(Arc::new(MemoryStorage::new()));
        let files = vec![SelectedFile::from_bytes("game.cue", Vec::<u8>::new())];

        assert!(matches!(
            bundler.pack_single_file(&files),
            Err(BundleError::LoneCue)
        ));
        assert!(matches!(
            bundler.pack_single_file(&[]),
            Err(BundleError::EmptySelection)
        ));
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn test_pack_single_file() {
        let (bundler, blobs) = bundler_with(Arc::new(MemoryStorage::new()));
        let files = vec![
            SelectedFile::from_bytes("game.cue", Vec::<u8>::new()),
            SelectedFile::from_bytes("game.iso", vec![5u8; 8]),
        ];

        let rom = bundler.pack_single_file(&files).unwrap();
        assert_eq!(rom.file_name, "game.iso");
        assert_eq!(&*blobs.resolve(&rom.blob).unwrap().data, &[5u8; 8][..]);
    }
}
