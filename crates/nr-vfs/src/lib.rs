//! Blob registry, session storage and ROM bundling for nostalgia-room

pub mod blob;
pub mod bundle;
pub mod file;
pub mod formats;
pub mod lifecycle;
pub mod storage;

pub use blob::{is_blob_ref, Blob, BlobStore};
pub use bundle::{find_cue, pick_rom_file, CueBundle, RomBundler, SingleRom, ROM_EXT_PRIORITY};
pub use file::SelectedFile;
pub use lifecycle::ResourceTracker;
pub use storage::{ExternalFilesMap, ExternalFilesStore, MemoryStorage, SessionStorage};
