/*!
Error types for the confhist history store.
*/

use thiserror::Error;

/// Result type used throughout the confhist core.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that can occur while recording or locating history entries.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// A snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A history location could not be created or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The history root could not be listed
    #[error("History store unavailable: {0}")]
    StoreUnavailable(String),

    /// The composite identifier is too short or cannot be split
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// The positional part of a composite identifier is not a valid 32-bit hex value
    #[error("Malformed position: {0}")]
    MalformedPosition(String),

    /// Invalid configuration or input value
    #[error("Validation error: {0}")]
    Validation(String),
}

impl HistoryError {
    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new store-unavailable error
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a new malformed identifier error
    pub fn malformed_identifier<S: Into<String>>(msg: S) -> Self {
        Self::MalformedIdentifier(msg.into())
    }

    /// Create a new malformed position error
    pub fn malformed_position<S: Into<String>>(msg: S) -> Self {
        Self::MalformedPosition(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors caused by a bad caller-supplied identifier
    pub fn is_identifier_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedIdentifier(_) | Self::MalformedPosition(_)
        )
    }
}
