/*!
# confhist Core

Content-addressable history of tool configurations.

Every time a tool finishes a run it can record the configuration it ran
with. The configuration is stamped with the current time, serialized to
JSON, and written to `<history root>/<sha256 of the bytes>/options`. Later,
a short composite identifier (five hash characters followed by a hex
position) finds the entry again together with the position the caller
embedded in it.

## Architecture

- [`HistoryStore`] records and locates snapshots
- [`HistoryStorage`] is the storage port; [`LocalHistoryStorage`] is the
  filesystem adapter
- [`CompositeIdentifier`] encodes and decodes identifiers without any I/O
- The history root is passed in explicitly through [`HistoryConfig`]

## Usage

```rust
use confhist_core::{create_history_store, CompositeIdentifier, HistoryConfig};

let root = tempfile::tempdir()?;
let store = create_history_store(HistoryConfig::with_root(root.path()))?;

let options = serde_json::json!({"url": "https://example.com/FUZZ", "threads": 40});
let hash = store.record(&options)?;

// Hand the identifier to a user; resume at position 0x2a later
let identifier = CompositeIdentifier::for_hash(&hash, 0x2a).to_string();
let located = store.locate::<serde_json::Value>(&identifier)?;
assert_eq!(located.position, 42);
assert_eq!(located.snapshots.len(), 1);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub mod config;
pub mod error;
pub mod hash;
pub mod history;
pub mod identifier;
pub mod observability;
pub mod snapshot;
pub mod storage;

#[cfg(test)]
mod error_tests;

pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use hash::ContentHash;
pub use history::{create_history_store, HistoryStore, Located};
pub use identifier::{CompositeIdentifier, HASH_PREFIX_LEN, MIN_IDENTIFIER_LEN};
pub use snapshot::ConfigurationSnapshot;
pub use storage::{HistoryStorage, LocalHistoryStorage};
