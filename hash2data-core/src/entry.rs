use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// A token bound to a payload, with its context and expiry
///
/// Entries are created and updated only through a [`Store`](crate::Store).
/// The token and context never change once the entry exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    token: String,
    payload: T,
    context: String,
    /// Seconds since the Unix epoch; `None` never expires
    expires_at: Option<u64>,
}

impl<T> Entry<T> {
    /// Creates an entry expiring `ttl_seconds` after `now`, or never if the TTL is 0
    pub(crate) fn create(
        token: String,
        payload: T,
        context: impl Into<String>,
        ttl_seconds: u64,
        now: u64,
    ) -> Self {
        let expires_at = (ttl_seconds > 0).then(|| now.saturating_add(ttl_seconds));
        Self {
            token,
            payload,
            context: context.into(),
            expires_at,
        }
    }

    /// Returns the token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the bound payload
    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub(crate) fn into_payload(self) -> T {
        self.payload
    }

    /// Returns the context label
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Returns the expiration time in seconds since the Unix epoch, `None` for never
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    /// Checks if this entry has expired at `now`
    ///
    /// An entry is already expired at its exact expiry second.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Checks if this entry is live and bound to `token` within `context`
    pub fn matches(&self, token: &str, context: &str, now: u64) -> bool {
        context == self.context && !self.is_expired(now) && self.token_eq(token)
    }

    /// Replaces the payload and adjusts the expiry
    ///
    /// # TTL Semantics
    ///
    /// - **Positive TTL** expires the entry `ttl_seconds` after `now`.
    /// - **TTL of 0** makes the entry never expire.
    /// - **Negative TTL** keeps the current expiry.
    pub(crate) fn update(&mut self, payload: T, ttl_seconds: i64, now: u64) {
        if ttl_seconds > 0 {
            self.expires_at = Some(now.saturating_add(ttl_seconds.unsigned_abs()));
        } else if ttl_seconds == 0 {
            self.expires_at = None;
        }
        self.payload = payload;
    }

    /// Constant-time token comparison; lengths are public
    fn token_eq(&self, token: &str) -> bool {
        let expected = self.token.as_bytes();
        let provided = token.as_bytes();
        if expected.len() != provided.len() {
            return false;
        }
        expected.ct_eq(provided).into()
    }

    #[cfg(test)]
    pub(crate) fn with_expiry(token: &str, payload: T, context: &str, expires_at: Option<u64>) -> Self {
        Self {
            token: token.to_string(),
            payload,
            context: context.to_string(),
            expires_at,
        }
    }
}
