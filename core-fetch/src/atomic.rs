//! Write-then-rename file replacement.
//!
//! Every writer gets its own `<name>.<uuid>.part` sibling, so concurrent
//! writers of the same destination never share a temp file. The final path
//! only ever changes through a rename of a fully written file.

use core_async::fs;
use core_runtime::logging::strip_path;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::error::{FetchError, Result};

/// Temp sibling of a destination, removed on drop unless persisted.
///
/// Dropping covers error returns as well as abandoned futures.
#[derive(Debug)]
pub struct PartFile {
    path: PathBuf,
    persisted: bool,
}

impl PartFile {
    pub fn for_destination(destination: &Path) -> Self {
        let mut name = destination
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.part", Uuid::new_v4().simple()));
        Self {
            path: destination.with_file_name(name),
            persisted: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the temp file over `destination`.
    pub async fn persist(mut self, destination: &Path) -> Result<()> {
        fs::rename(&self.path, destination)
            .await
            .map_err(|e| FetchError::io(destination, e))?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                file = %strip_path(&self.path.to_string_lossy()),
                error = %e,
                "Failed to remove partial file"
            ),
        }
    }
}

/// Creates the parent directory of `path` if needed.
pub async fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e)),
        _ => Ok(()),
    }
}

/// Writes `bytes` to `destination` through a private temp file.
pub async fn write_bytes_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(destination).await?;
    let part = PartFile::for_destination(destination);
    fs::write(part.path(), bytes)
        .await
        .map_err(|e| FetchError::io(part.path(), e))?;
    part.persist(destination).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_files_are_unique_siblings() {
        let first = PartFile::for_destination(Path::new("/d/abc.mp3"));
        let second = PartFile::for_destination(Path::new("/d/abc.mp3"));

        assert_eq!(first.path().parent(), Some(Path::new("/d")));
        let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("abc.mp3.") && name.ends_with(".part"));
        assert_ne!(first.path(), second.path());
    }

    #[tokio::test]
    async fn test_dropped_part_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let part = PartFile::for_destination(&dir.path().join("abc.mp3"));
        std::fs::write(part.path(), b"half").unwrap();
        let temp = part.path().to_path_buf();

        drop(part);
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_write_bytes_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("abc.mp3");

        write_bytes_atomically(&dest, b"one").await.unwrap();
        write_bytes_atomically(&dest, b"two").await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"two");
        assert_eq!(std::fs::read_dir(dest.parent().unwrap()).unwrap().count(), 1);
    }
}
