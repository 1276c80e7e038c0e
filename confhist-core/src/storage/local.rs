/*!
Local filesystem storage for history locations.
*/

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{HistoryStorage, OPTIONS_FILE_NAME};
use crate::hash::ContentHash;
use crate::{HistoryError, Result};

/// File mode of written `options` files
#[cfg(unix)]
const OPTIONS_FILE_MODE: u32 = 0o640;

/// Filesystem layout `<root>/<hash>/options`
///
/// Writes are staged in a temporary file inside the location directory and
/// renamed onto `options`, so a reader never observes a partially written
/// snapshot.
///
/// # Example
/// ```rust
/// use confhist_core::storage::{HistoryStorage, LocalHistoryStorage};
/// use confhist_core::ContentHash;
///
/// let root = tempfile::tempdir()?;
/// let storage = LocalHistoryStorage::new(root.path());
/// let hash = ContentHash::compute(b"{}");
/// storage.write_options(&hash, b"{}")?;
/// assert_eq!(storage.list_locations()?, vec![hash.to_string()]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct LocalHistoryStorage {
    root: PathBuf,
}

impl LocalHistoryStorage {
    /// Create a storage rooted at `root`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn location_dir(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }

    fn options_path(&self, location: &str) -> PathBuf {
        self.location_dir(location).join(OPTIONS_FILE_NAME)
    }
}

impl HistoryStorage for LocalHistoryStorage {
    fn write_options(&self, hash: &ContentHash, data: &[u8]) -> Result<()> {
        let dir = self.location_dir(hash.as_str());
        fs::create_dir_all(&dir).map_err(|e| {
            HistoryError::storage(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;

        let path = dir.join(OPTIONS_FILE_NAME);
        let mut staged = NamedTempFile::new_in(&dir).map_err(|e| {
            HistoryError::storage(format!(
                "Failed to create staging file in {}: {}",
                dir.display(),
                e
            ))
        })?;
        staged.write_all(data).map_err(|e| {
            HistoryError::storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(OPTIONS_FILE_MODE))
                .map_err(|e| {
                    HistoryError::storage(format!(
                        "Failed to set permissions on {}: {}",
                        path.display(),
                        e
                    ))
                })?;
        }

        staged.persist(&path).map_err(|e| {
            HistoryError::storage(format!("Failed to write {}: {}", path.display(), e.error))
        })?;

        debug!(path = %path.display(), bytes = data.len(), "Wrote history options");
        Ok(())
    }

    fn list_locations(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            HistoryError::store_unavailable(format!(
                "Failed to list {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut locations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                HistoryError::store_unavailable(format!(
                    "Failed to list {}: {}",
                    self.root.display(),
                    e
                ))
            })?;

            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!(entry = ?entry.path(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            }

            match entry.file_name().into_string() {
                Ok(name) => locations.push(name),
                Err(name) => debug!(entry = ?name, "Skipping non UTF-8 entry"),
            }
        }

        locations.sort();
        Ok(locations)
    }

    fn read_options(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.options_path(location);
        fs::read(&path).map_err(|e| {
            HistoryError::storage(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}
