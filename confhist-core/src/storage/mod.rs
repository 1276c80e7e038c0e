/*!
Storage port for history locations.

A history location is a directory named by a full content hash, holding a
single `options` file with the serialized snapshot. The history store only
depends on this trait, so it can be exercised against memory in tests and
against the filesystem in production.
*/

pub mod local;

use crate::hash::ContentHash;
use crate::Result;

/// Name of the file holding the serialized snapshot inside each location
pub const OPTIONS_FILE_NAME: &str = "options";

/// Storage abstraction over the set of history locations
pub trait HistoryStorage {
    /// Write the serialized snapshot into the location named by `hash`
    ///
    /// Creates the location if needed and replaces any existing `options`
    /// content. Identical content always maps to the same location, so
    /// rewriting it is harmless.
    ///
    /// # Errors
    /// * `HistoryError::Storage` - the location cannot be created or written
    fn write_options(&self, hash: &ContentHash, data: &[u8]) -> Result<()>;

    /// Names of every location directly under the history root
    ///
    /// # Errors
    /// * `HistoryError::StoreUnavailable` - the history root cannot be listed
    fn list_locations(&self) -> Result<Vec<String>>;

    /// Read the serialized snapshot stored in `location`
    ///
    /// # Errors
    /// * `HistoryError::Storage` - the `options` file is missing or unreadable
    fn read_options(&self, location: &str) -> Result<Vec<u8>>;
}

// Re-export types for convenience
pub use local::LocalHistoryStorage;

/// Memory-based storage for unit testing
///
/// Locations are kept in a sorted map so listings are deterministic. A
/// location mapped to `None` models a directory without a readable
/// `options` file.
#[cfg(test)]
pub struct MemoryHistoryStorage {
    locations: std::sync::Mutex<std::collections::BTreeMap<String, Option<Vec<u8>>>>,
    list_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl Default for MemoryHistoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MemoryHistoryStorage {
    pub fn new() -> Self {
        Self {
            locations: std::sync::Mutex::new(std::collections::BTreeMap::new()),
            list_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Insert raw content under an arbitrary location name
    pub fn insert_raw(&self, location: &str, data: Option<&[u8]>) {
        let mut locations = self.locations.lock().unwrap();
        locations.insert(location.to_string(), data.map(|d| d.to_vec()));
    }

    pub fn len(&self) -> usize {
        self.locations.lock().unwrap().len()
    }

    /// How many times the locations were listed
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl HistoryStorage for MemoryHistoryStorage {
    fn write_options(&self, hash: &ContentHash, data: &[u8]) -> Result<()> {
        let mut locations = self.locations.lock().unwrap();
        locations.insert(hash.to_string(), Some(data.to_vec()));
        Ok(())
    }

    fn list_locations(&self) -> Result<Vec<String>> {
        self.list_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let locations = self.locations.lock().unwrap();
        Ok(locations.keys().cloned().collect())
    }

    fn read_options(&self, location: &str) -> Result<Vec<u8>> {
        let locations = self.locations.lock().unwrap();
        locations
            .get(location)
            .cloned()
            .flatten()
            .ok_or_else(|| crate::HistoryError::storage(format!("No options in {location}")))
    }
}
