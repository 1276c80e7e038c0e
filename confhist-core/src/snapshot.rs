/*!
The persisted unit of history: a configuration and the moment it was recorded.
*/

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::Result;

/// A configuration together with its recording timestamp
///
/// The serialized form of this struct is both the payload written to disk and
/// the input of its [`ContentHash`]. Fields serialize in declaration order, so
/// configurations with a stable field order hash reproducibly.
///
/// # Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use confhist_core::ConfigurationSnapshot;
///
/// let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// let snapshot = ConfigurationSnapshot::new(serde_json::json!({"threads": 40}), at);
/// let bytes = snapshot.to_bytes()?;
/// assert_eq!(
///     String::from_utf8(bytes).unwrap(),
///     r#"{"configuration":{"threads":40},"recorded_at":"2024-01-02T03:04:05Z"}"#
/// );
/// # Ok::<(), confhist_core::HistoryError>(())
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigurationSnapshot<C> {
    /// Caller-supplied configuration, opaque to the store
    pub configuration: C,

    /// RFC 3339 timestamp taken when the snapshot was recorded
    pub recorded_at: DateTime<Utc>,
}

impl<C> ConfigurationSnapshot<C> {
    pub fn new(configuration: C, recorded_at: DateTime<Utc>) -> Self {
        Self {
            configuration,
            recorded_at,
        }
    }

    /// Stamp the configuration with the current time
    pub fn now(configuration: C) -> Self {
        Self::new(configuration, Utc::now())
    }

    pub fn into_configuration(self) -> C {
        self.configuration
    }
}

impl<C: Serialize> ConfigurationSnapshot<C> {
    /// Canonical serialized bytes, used both as payload and hash input
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Hash of the canonical serialized bytes
    pub fn content_hash(&self) -> Result<ContentHash> {
        Ok(ContentHash::compute(&self.to_bytes()?))
    }
}

impl<C: DeserializeOwned> ConfigurationSnapshot<C> {
    /// Decode a snapshot previously produced by [`ConfigurationSnapshot::to_bytes`]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
