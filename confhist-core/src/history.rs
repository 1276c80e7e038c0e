/*!
History store that records configurations and locates them again.

This module contains the two operations of the store: recording a
configuration under the hash of its serialized snapshot, and locating
snapshots from a composite identifier. They share nothing but the storage
layout.
*/

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::hash::ContentHash;
use crate::identifier::CompositeIdentifier;
use crate::snapshot::ConfigurationSnapshot;
use crate::storage::{HistoryStorage, LocalHistoryStorage};
use crate::Result;

#[cfg(feature = "metrics")]
use crate::observability::HistoryMetrics;

/// Outcome of a successful [`HistoryStore::locate`] call
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Located<C> {
    /// Decoded snapshots, in location listing order
    pub snapshots: Vec<ConfigurationSnapshot<C>>,

    /// Position carried by the composite identifier
    pub position: i32,

    /// Matching locations that could not be read or decoded
    ///
    /// These never appear in `snapshots` and never fail the call. An empty
    /// `snapshots` with a non-zero `skipped` means the prefix did match.
    pub skipped: usize,
}

impl<C> Located<C> {
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Reorder snapshots oldest first
    pub fn into_chronological(mut self) -> Self {
        self.snapshots.sort_by_key(|snapshot| snapshot.recorded_at);
        self
    }
}

/// Main entry point for recording and locating configuration history
///
/// # Example
/// ```rust
/// use confhist_core::{CompositeIdentifier, HistoryStore, LocalHistoryStorage};
///
/// let root = tempfile::tempdir()?;
/// let store = HistoryStore::new(LocalHistoryStorage::new(root.path()));
///
/// let options = serde_json::json!({"url": "https://example.com/FUZZ", "threads": 40});
/// let hash = store.record(&options)?;
///
/// let identifier = CompositeIdentifier::for_hash(&hash, 0x1f).to_string();
/// let located = store.locate::<serde_json::Value>(&identifier)?;
/// assert_eq!(located.position, 31);
/// assert_eq!(located.snapshots[0].configuration, options);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HistoryStore<S>
where
    S: HistoryStorage,
{
    storage: S,
}

impl<S> HistoryStore<S>
where
    S: HistoryStorage,
{
    /// Create a new history store on top of the given storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Record a configuration stamped with the current time
    ///
    /// # Returns
    /// The content hash naming the new history location
    ///
    /// # Errors
    /// * `HistoryError::Serialization` - the snapshot cannot be encoded
    /// * `HistoryError::Storage` - the location cannot be created or written
    pub fn record<C: Serialize>(&self, configuration: &C) -> Result<ContentHash> {
        self.record_at(configuration, Utc::now())
    }

    /// Record a configuration with an explicit timestamp
    ///
    /// Identical configurations recorded at the same instant serialize to the
    /// same bytes and therefore share one location.
    pub fn record_at<C: Serialize>(
        &self,
        configuration: &C,
        recorded_at: DateTime<Utc>,
    ) -> Result<ContentHash> {
        self.record_snapshot(&ConfigurationSnapshot::new(configuration, recorded_at))
    }

    /// Persist an already-built snapshot under the hash of its serialized bytes
    pub fn record_snapshot<C: Serialize>(
        &self,
        snapshot: &ConfigurationSnapshot<C>,
    ) -> Result<ContentHash> {
        let result = self.write_snapshot(snapshot);

        #[cfg(feature = "metrics")]
        {
            let metrics = HistoryMetrics::global();
            if result.is_ok() {
                metrics.record_write();
            } else {
                metrics.record_write_error();
            }
        }

        result
    }

    fn write_snapshot<C: Serialize>(
        &self,
        snapshot: &ConfigurationSnapshot<C>,
    ) -> Result<ContentHash> {
        let bytes = snapshot.to_bytes()?;
        let hash = ContentHash::compute(&bytes);

        self.storage.write_options(&hash, &bytes)?;

        #[cfg(feature = "metrics")]
        HistoryMetrics::global().record_snapshot_size(bytes.len());

        debug!(hash = %hash, bytes = bytes.len(), "Recorded history entry");
        Ok(hash)
    }

    /// Locate every snapshot whose location matches the identifier's hash prefix
    ///
    /// The identifier is decoded before any storage access. Matching ignores
    /// case. Locations that cannot be read or decoded are skipped and counted
    /// in [`Located::skipped`].
    ///
    /// # Errors
    /// * `HistoryError::MalformedIdentifier` / `HistoryError::MalformedPosition` - bad identifier
    /// * `HistoryError::StoreUnavailable` - the history root cannot be listed
    pub fn locate<C: DeserializeOwned>(&self, identifier: &str) -> Result<Located<C>> {
        let identifier = CompositeIdentifier::decode(identifier)?;

        #[cfg(feature = "metrics")]
        HistoryMetrics::global().record_locate();

        let matching: Vec<String> = self
            .storage
            .list_locations()?
            .into_iter()
            .filter(|location| identifier.matches(location))
            .collect();

        let mut snapshots = Vec::with_capacity(matching.len());
        let mut skipped = 0;
        for location in &matching {
            match self.read_snapshot(location) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(location = %location, error = %e, "Skipping unreadable history entry");
                    skipped += 1;
                }
            }
        }

        #[cfg(feature = "metrics")]
        HistoryMetrics::global().record_skipped(skipped);

        debug!(
            prefix = %identifier.hash_prefix,
            position = identifier.position,
            matched = matching.len(),
            decoded = snapshots.len(),
            "Located history entries"
        );

        Ok(Located {
            snapshots,
            position: identifier.position,
            skipped,
        })
    }

    fn read_snapshot<C: DeserializeOwned>(
        &self,
        location: &str,
    ) -> Result<ConfigurationSnapshot<C>> {
        let bytes = self.storage.read_options(location)?;
        ConfigurationSnapshot::from_bytes(&bytes)
    }
}

/// Create a history store on the local filesystem from configuration
pub fn create_history_store(config: HistoryConfig) -> Result<HistoryStore<LocalHistoryStorage>> {
    config.validate()?;
    Ok(HistoryStore::new(LocalHistoryStorage::new(config.root)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryHistoryStorage;
    use crate::HistoryError;
    use chrono::TimeZone;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    struct ScanOptions {
        url: String,
        threads: u32,
        recursion: bool,
    }

    fn scan_options(url: &str) -> ScanOptions {
        ScanOptions {
            url: url.to_string(),
            threads: 40,
            recursion: false,
        }
    }

    fn at(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, seconds).unwrap()
    }

    fn memory_store() -> HistoryStore<MemoryHistoryStorage> {
        HistoryStore::new(MemoryHistoryStorage::new())
    }

    #[test]
    fn test_record_then_locate() {
        let store = memory_store();
        let options = scan_options("https://example.com/FUZZ");

        let hash = store.record(&options).unwrap();
        let located: Located<ScanOptions> = store.locate(&format!("{}0", hash.prefix())).unwrap();

        assert_eq!(located.position, 0);
        assert_eq!(located.skipped, 0);
        assert_eq!(located.snapshots.len(), 1);
        assert_eq!(located.snapshots[0].configuration, options);
    }

    #[test]
    fn test_record_hashes_stored_bytes() {
        let store = memory_store();
        let hash = store.record_at(&scan_options("a"), at(0)).unwrap();

        let stored = store.storage().read_options(hash.as_str()).unwrap();
        assert!(hash.verify(&stored));
    }

    #[test]
    fn test_record_is_deterministic() {
        let store = memory_store();
        let options = scan_options("https://example.com/FUZZ");

        let first = store.record_at(&options, at(5)).unwrap();
        let second = store.record_at(&options, at(5)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.storage().len(), 1);
    }

    #[test]
    fn test_record_surfaces_serialization_error() {
        use std::collections::HashMap;

        let store = memory_store();
        let mut options: HashMap<(u8, u8), u8> = HashMap::new();
        options.insert((1, 2), 3);

        let result = store.record(&options);
        assert!(matches!(result, Err(HistoryError::Serialization(_))));
        assert_eq!(store.storage().len(), 0);
    }

    #[test]
    fn test_malformed_identifier_skips_listing() {
        let store = memory_store();
        store.record(&scan_options("a")).unwrap();

        let err = store.locate::<ScanOptions>("abc").unwrap_err();
        assert!(matches!(err, HistoryError::MalformedIdentifier(_)));

        let err = store.locate::<ScanOptions>("abcde-ZZ").unwrap_err();
        assert!(matches!(err, HistoryError::MalformedPosition(_)));

        assert_eq!(store.storage().list_calls(), 0);
    }

    #[test]
    fn test_corrupt_entries_are_skipped() {
        let store = memory_store();
        let good = ConfigurationSnapshot::new(scan_options("good"), at(1));
        let bytes = good.to_bytes().unwrap();

        store.storage().insert_raw("abcde0001", Some(bytes.as_slice()));
        store.storage().insert_raw("abcde0002", Some(&bytes[..bytes.len() / 2]));
        store.storage().insert_raw("abcde0003", None);

        let located: Located<ScanOptions> = store.locate("abcde0").unwrap();
        assert_eq!(located.snapshots, vec![good]);
        assert_eq!(located.skipped, 2);
    }

    #[test]
    fn test_prefix_matching_ignores_case() {
        let store = memory_store();
        let bytes = ConfigurationSnapshot::new(scan_options("upper"), at(2))
            .to_bytes()
            .unwrap();
        store.storage().insert_raw("AB12Cdeadbeef", Some(bytes.as_slice()));
        store.storage().insert_raw("ab13c0", Some(bytes.as_slice()));

        for identifier in ["ab12c0", "Ab12C0", "AB12C0"] {
            let located: Located<ScanOptions> = store.locate(identifier).unwrap();
            assert_eq!(located.snapshots.len(), 1, "{identifier}");
        }
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let store = memory_store();
        let hash = store.record(&scan_options("a")).unwrap();

        let first = if hash.as_str().starts_with('0') { '1' } else { '0' };
        let identifier = format!("{first}{}3", &hash.prefix()[1..]);

        let located: Located<ScanOptions> = store.locate(&identifier).unwrap();
        assert!(located.is_empty());
        assert_eq!(located.position, 3);
        assert_eq!(located.skipped, 0);
        assert_eq!(store.storage().list_calls(), 1);
    }

    #[test]
    fn test_located_order_and_chronological_sort() {
        let store = memory_store();
        let newer = ConfigurationSnapshot::new(scan_options("newer"), at(30));
        let older = ConfigurationSnapshot::new(scan_options("older"), at(10));
        store
            .storage()
            .insert_raw("fffff1", Some(older.to_bytes().unwrap().as_slice()));
        store
            .storage()
            .insert_raw("fffff0", Some(newer.to_bytes().unwrap().as_slice()));

        let located: Located<ScanOptions> = store.locate("fffff0").unwrap();
        assert_eq!(located.snapshots, vec![newer.clone(), older.clone()]);

        let located = located.into_chronological();
        assert_eq!(located.snapshots, vec![older, newer]);
    }

    #[test]
    fn test_create_history_store_validates_config() {
        let result = create_history_store(HistoryConfig::with_root(""));
        assert!(matches!(result, Err(HistoryError::Validation(_))));
    }
}
