//! Error types for the hash2data core

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a [`Store`](crate::Store)
///
/// A token that cannot be found is not an error: lookups report it as
/// `false` or `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// Hash size is odd, zero or too large
    #[error("invalid hash size {hash_size}: must be a positive even number no larger than {max}", max = crate::token::MAX_HASH_SIZE)]
    InvalidHashSize { hash_size: usize },

    /// The persistence backend failed to read or write the slot
    #[error("backend failure for slot '{name}': {source}")]
    Backend {
        name: String,
        #[source]
        source: BackendError,
    },

    /// The persisted slot exists but cannot be decoded
    #[error("slot '{name}' is corrupted: {source}")]
    Corrupted {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The entry sequence could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The random source could not produce token bytes
    #[error("random source error: {0}")]
    Random(#[from] rand::Error),

    /// Every freshly drawn token collided with a live one
    #[error("could not generate a unique token after {attempts} attempts")]
    TokenCollision { attempts: usize },
}

impl Error {
    /// Returns `true` if this error came from the persistence layer,
    /// corrupted slots included
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Error::Backend { .. } | Error::Corrupted { .. })
    }
}

/// Errors raised by a [`PersistenceBackend`](crate::PersistenceBackend)
#[derive(Error, Debug)]
pub enum BackendError {
    /// I/O error while reading or writing a slot
    #[error("I/O error on slot '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Slot name cannot be mapped to storage
    #[error("invalid slot name '{name}'")]
    InvalidName { name: String },
}
