/*!
Content hashes used as history location names.
*/

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::identifier::HASH_PREFIX_LEN;
use crate::{HistoryError, Result};

/// Length of a hex-encoded SHA-256 digest
pub const CONTENT_HASH_LEN: usize = 64;

/// Lowercase hex SHA-256 digest of a snapshot's serialized bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Compute the hash of the provided bytes
    ///
    /// # Example
    /// ```rust
    /// use confhist_core::ContentHash;
    ///
    /// let hash = ContentHash::compute(b"test data");
    /// assert_eq!(hash.prefix(), "916f0");
    /// ```
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading characters shown to users and embedded in composite identifiers
    pub fn prefix(&self) -> &str {
        &self.0[..HASH_PREFIX_LEN]
    }

    /// True if `data` hashes to this value
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute(data) == *self
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != CONTENT_HASH_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HistoryError::validation(format!(
                "expected {CONTENT_HASH_LEN} hex characters, got '{s}'"
            )));
        }
        Ok(ContentHash(s.to_ascii_lowercase()))
    }
}
