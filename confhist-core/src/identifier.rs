/*!
Composite identifiers: a truncated content hash followed by a hex position.

An identifier such as `916f01f` carries two independent values. The first
[`HASH_PREFIX_LEN`] characters select history locations by prefix; the rest
is a base-16 position whose meaning belongs to the caller. Encoding and
decoding never touch the filesystem.
*/

use std::fmt;
use std::str::FromStr;

use crate::hash::ContentHash;
use crate::{HistoryError, Result};

/// Number of leading hash characters carried by a composite identifier
pub const HASH_PREFIX_LEN: usize = 5;

/// Shortest accepted identifier: the hash prefix plus one position digit
pub const MIN_IDENTIFIER_LEN: usize = HASH_PREFIX_LEN + 1;

/// Decoded form of a composite identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIdentifier {
    /// Hash prefix exactly as supplied; case is ignored only when matching
    pub hash_prefix: String,
    /// Caller-defined position, opaque to the store
    pub position: i32,
}

impl CompositeIdentifier {
    /// Build the identifier pointing at `position` within the entry stored under `hash`
    ///
    /// # Example
    /// ```rust
    /// use confhist_core::{CompositeIdentifier, ContentHash};
    ///
    /// let hash = ContentHash::compute(b"test data");
    /// let id = CompositeIdentifier::for_hash(&hash, 31);
    /// assert_eq!(id.to_string(), "916f01f");
    /// ```
    pub fn for_hash(hash: &ContentHash, position: i32) -> Self {
        Self {
            hash_prefix: hash.prefix().to_string(),
            position,
        }
    }

    /// Split a composite identifier into its hash prefix and position
    ///
    /// # Errors
    /// * `HistoryError::MalformedIdentifier` - shorter than [`MIN_IDENTIFIER_LEN`] bytes
    /// * `HistoryError::MalformedPosition` - the remainder is not a base-16 value in `i32` range,
    ///   including when the split point falls inside a multi-byte character
    pub fn decode(s: &str) -> Result<Self> {
        if s.len() < MIN_IDENTIFIER_LEN {
            return Err(HistoryError::malformed_identifier(format!(
                "'{s}' is shorter than {MIN_IDENTIFIER_LEN} characters"
            )));
        }

        let (hash_prefix, position) = match (s.get(..HASH_PREFIX_LEN), s.get(HASH_PREFIX_LEN..)) {
            (Some(prefix), Some(rest)) => (prefix, rest),
            _ => {
                return Err(HistoryError::malformed_position(format!(
                    "no hex position after byte {HASH_PREFIX_LEN} in '{s}'"
                )))
            }
        };

        let position = i32::from_str_radix(position, 16).map_err(|e| {
            HistoryError::malformed_position(format!("'{position}' in '{s}': {e}"))
        })?;

        Ok(Self {
            hash_prefix: hash_prefix.to_string(),
            position,
        })
    }

    /// Case-insensitive test of a location name against the hash prefix
    pub fn matches(&self, location: &str) -> bool {
        location
            .to_lowercase()
            .starts_with(&self.hash_prefix.to_lowercase())
    }
}

impl fmt::Display for CompositeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.position < 0 {
            let magnitude = i64::from(self.position).unsigned_abs();
            write!(f, "{}-{:x}", self.hash_prefix, magnitude)
        } else {
            write!(f, "{}{:x}", self.hash_prefix, self.position)
        }
    }
}

impl FromStr for CompositeIdentifier {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
