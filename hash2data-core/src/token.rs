use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Largest accepted token length in hex characters
pub const MAX_HASH_SIZE: usize = 1024;

/// Source of random bytes for tokens
///
/// Implementations must be cryptographically secure: tokens are bearer
/// secrets and anyone who can guess one can read or consume its payload.
pub trait TokenGenerator: Send + Sync {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<()>;
}

/// Token generator backed by the operating system's random source
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(buf)?;
        Ok(())
    }
}

/// Checks that `hash_size` describes a whole number of bytes, at most
/// [`MAX_HASH_SIZE`] hex characters
pub(crate) fn validate_hash_size(hash_size: usize) -> Result<()> {
    if hash_size == 0 || hash_size % 2 != 0 || hash_size > MAX_HASH_SIZE {
        return Err(Error::InvalidHashSize { hash_size });
    }
    Ok(())
}

/// Draws `hash_size / 2` random bytes and renders them as `hash_size`
/// lowercase hex characters
pub fn generate_token(generator: &dyn TokenGenerator, hash_size: usize) -> Result<String> {
    validate_hash_size(hash_size)?;

    let mut bytes = vec![0u8; hash_size / 2];
    generator.fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Shortens a token for log output
///
/// Keeps at most four characters and never more than half the token, so
/// short tokens are not logged whole.
pub(crate) fn truncate_token_for_log(token: &str) -> String {
    const MAX_LOG_TOKEN_PREFIX: usize = 4;
    let keep = MAX_LOG_TOKEN_PREFIX.min(token.chars().count() / 2);
    // Callers may pass arbitrary user input, so cut on a char boundary
    let cut = token
        .char_indices()
        .nth(keep)
        .map_or(token.len(), |(cut, _)| cut);
    format!("{}...", &token[..cut])
}
