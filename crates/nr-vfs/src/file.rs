//! User-selected files

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Base name of `name`, accepting both `/` and `\` separators
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Lower-cased extension of `name` including the dot, or `""`
pub fn extension(name: &str) -> String {
    name.rfind('.')
        .map(|dot| name[dot..].to_ascii_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
enum Contents {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// A file picked by the user: a name plus readable content
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    contents: Contents,
}

impl SelectedFile {
    /// File whose content is already in memory
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            contents: Contents::Memory(data.into()),
        }
    }

    /// File on disk, read lazily when the content is needed
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Not a file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(Self {
            name,
            contents: Contents::Disk(path.to_path_buf()),
        })
    }

    /// Name as reported by the picker
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }

    pub fn extension(&self) -> String {
        extension(&self.name)
    }

    /// Name with double quotes removed, safe to embed in a cue `FILE` line
    pub fn clean_name(&self) -> String {
        self.name.replace('"', "")
    }

    /// Read the whole content
    pub fn read(&self) -> io::Result<Arc<[u8]>> {
        match &self.contents {
            Contents::Memory(data) => Ok(data.clone()),
            Contents::Disk(path) => Ok(std::fs::read(path)?.into()),
        }
    }

    /// Read the content as text, replacing invalid UTF-8
    pub fn text(&self) -> io::Result<String> {
        let data = self.read()?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("track.bin"), "track.bin");
        assert_eq!(base_name("dir/sub/track.bin"), "track.bin");
        assert_eq!(base_name(r"C:\roms\track.bin"), "track.bin");
        assert_eq!(base_name(r"mixed/dir\track.bin"), "track.bin");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("Game.CUE"), ".cue");
        assert_eq!(extension("game.tar.chd"), ".chd");
        assert_eq!(extension("README"), "");
    }

    #[test]
    fn test_clean_name_strips_quotes() {
        let file = SelectedFile::from_bytes("odd\"name\".bin", Vec::<u8>::new());
        assert_eq!(file.clean_name(), "oddname.bin");
    }

    #[test]
    fn test_from_path_reads_lazily() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("game.cue");
        std::fs::write(&path, "FILE \"game.bin\" BINARY\n").unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.name(), "game.cue");
        assert_eq!(file.extension(), ".cue");

        std::fs::write(&path, "changed").unwrap();
        assert_eq!(file.text().unwrap(), "changed");

        std::fs::remove_file(&path).unwrap();
        assert!(file.read().is_err());
    }

    #[test]
    fn test_from_path_rejects_directory() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        assert!(SelectedFile::from_path(dir.path()).is_err());
    }
}
