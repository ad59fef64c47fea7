//! Directory-backed storage backend.

use std::fmt::Write as _;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::KeyValueStore;
use crate::error::StorageError;

/// Key-value store that keeps one file per key under a directory.
///
/// Keys are encoded into file names: ASCII letters, digits, `-` and `.` are
/// kept, every other byte becomes `_XX` (hex). `@GoMarketplace:products` is
/// stored as `_40GoMarketplace_3Aproducts.json`.
///
/// Each write goes to its own uniquely named temporary file in the same
/// directory, which is then renamed over the target. A crash mid-write leaves
/// the previous blob intact, and concurrent writers (several stores or
/// processes sharing the directory) never touch each other's temporary
/// files; the last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored file for key");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let dir = self.dir.clone();
        let path = self.path_for(key);
        let target = path.clone();
        let body = value.to_owned();
        tokio::task::spawn_blocking(move || write_replacing(&dir, &target, body.as_bytes()))
            .await
            .map_err(|e| StorageError::Backend(format!("file write task failed: {e}")))??;

        debug!(path = %path.display(), bytes = value.len(), "Stored file for key");
        Ok(())
    }
}

/// Write `contents` to a fresh temporary file in `dir`, then rename it to `path`.
fn write_replacing(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Encode a storage key into a portable file name.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "_{byte:02X}");
        }
    }
    encoded
}
