use crate::error::Result;
use crate::token::validate_hash_size;

/// Slot name used when none is configured
pub const DEFAULT_STORE_NAME: &str = "hash2data-lib";

/// Token length in hex characters used when none is configured
pub const DEFAULT_HASH_SIZE: usize = 64;

/// Configuration for a [`Store`](crate::Store)
///
/// # Example
///
/// ```rust
/// use hash2data_core::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_name("captcha")
///     .with_default_ttl(300)
///     .with_hash_size(32);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend slot the entry sequence is persisted under (default: "hash2data-lib")
    pub name: String,
    /// TTL in seconds applied when a save doesn't give one (default: 0, never expire)
    pub default_ttl: u64,
    /// Token length in hex characters, even and at most 1024 (default: 64)
    pub hash_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            default_ttl: 0,
            hash_size: DEFAULT_HASH_SIZE,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend slot name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the TTL used by saves that inherit it
    ///
    /// # Arguments
    ///
    /// * `ttl_seconds` - Seconds until expiry; 0 means entries never expire
    pub fn with_default_ttl(mut self, ttl_seconds: u64) -> Self {
        self.default_ttl = ttl_seconds;
        self
    }

    /// Sets the token length in hex characters
    ///
    /// Each token is drawn from `hash_size / 2` random bytes, so the size
    /// must be even, non-zero and at most
    /// [`MAX_HASH_SIZE`](crate::MAX_HASH_SIZE). This is checked when the
    /// store opens.
    pub fn with_hash_size(mut self, hash_size: usize) -> Self {
        self.hash_size = hash_size;
        self
    }

    /// Rejects configurations a store cannot operate with
    pub fn validate(&self) -> Result<()> {
        validate_hash_size(self.hash_size)
    }
}
