//! Error types for the nostalgia-room session core

use thiserror::Error;

/// Main error type for the session core
#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Game not found: {0}")]
    GameNotFound(String),
}

/// Errors raised while turning a file selection into a loadable ROM.
///
/// The `Display` text of each variant is shown to the user as the load hint,
/// so it is written as a sentence.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Missing files referenced by .cue: {}", .0.join(", "))]
    MissingReferences(Vec<String>),

    #[error("The .cue has no valid FILE tracks.")]
    NoValidTracks,

    #[error("Could not read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not prepare the multi-file set in session storage.")]
    Persist(#[source] StorageError),

    #[error(
        "Only a .cue was detected. Select its .bin/.img tracks as well or use a .chd/.iso version."
    )]
    LoneCue,

    #[error("No files were selected.")]
    EmptySelection,
}

/// Session-scoped key/value storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Quota exceeded writing {key}: needed {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Result type alias for session core operations
pub type Result<T> = std::result::Result<T, RoomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_references_names_every_file() {
        let err = BundleError::MissingReferences(vec!["a.bin".into(), "b.bin".into()]);
        assert_eq!(
            format!("{}", err),
            "Missing files referenced by .cue: a.bin, b.bin"
        );
    }

    #[test]
    fn test_quota_display() {
        let err = StorageError::QuotaExceeded {
            key: "k".to_string(),
            needed: 10,
            available: 4,
        };
        assert_eq!(
            format!("{}", err),
            "Quota exceeded writing k: needed 10 bytes, 4 available"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: RoomError = BundleError::NoValidTracks.into();
        assert!(matches!(err, RoomError::Bundle(BundleError::NoValidTracks)));

        let err: RoomError = StorageError::Serialize("bad".into()).into();
        assert!(matches!(err, RoomError::Storage(_)));
    }
}
