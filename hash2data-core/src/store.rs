use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::backend::PersistenceBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::token::{generate_token, truncate_token_for_log, OsTokenGenerator, TokenGenerator};

/// TTL argument that falls back to the store default on save and keeps the
/// current expiry on update
pub const INHERIT_TTL: i64 = -1;

/// TTL argument for entries that never expire
pub const NEVER_EXPIRE: i64 = 0;

/// The empty context
pub const NO_CONTEXT: &str = "";

/// How many tokens a save draws before giving up on finding an unused one
pub const MAX_TOKEN_ATTEMPTS: usize = 8;

/// Ordered, session-scoped collection of token-bound entries
///
/// Opening a store reads its slot from the backend once. Every mutation
/// writes the whole sequence back, so the backend always holds exactly what
/// the store holds in memory.
///
/// Lookups scan from the newest entry to the oldest, so if a token were ever
/// duplicated within a context, the newest entry wins.
///
/// # Expiry
///
/// Expired entries never match, but they are only evicted when a store is
/// opened. Eviction walks backward from the newest entry and stops at the
/// first expired one: that entry and everything older is dropped, even an
/// older entry whose own TTL has not run out. Right after an open, the store
/// holds no expired entries.
///
/// # Concurrency
///
/// A store is not shared. The backend read at open and the writes after each
/// mutation are not atomic as a whole, so two stores open on the same slot
/// will lose each other's updates.
///
/// # Example
///
/// ```rust
/// use hash2data_core::{MemoryBackend, Store, StoreConfig, INHERIT_TTL, NO_CONTEXT};
/// use std::sync::Arc;
///
/// # fn main() -> hash2data_core::Result<()> {
/// let session = MemoryBackend::new();
/// let mut store: Store<u32> = Store::open(StoreConfig::default(), Arc::new(session))?;
///
/// let token = store.save(42, NO_CONTEXT, INHERIT_TTL)?;
/// assert_eq!(store.load(&token, NO_CONTEXT), Some(42));
/// assert!(store.delete(&token, NO_CONTEXT)?);
/// assert!(!store.exists(&token, NO_CONTEXT));
/// # Ok(())
/// # }
/// ```
pub struct Store<T> {
    config: StoreConfig,
    entries: Vec<Entry<T>>,
    backend: Arc<dyn PersistenceBackend>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Opens the store with the wall clock and the OS random source
    ///
    /// # Errors
    ///
    /// - `Error::InvalidHashSize` if the configured hash size is odd, zero or
    ///   above `MAX_HASH_SIZE`
    /// - `Error::Backend` if the slot cannot be read, or the pruned sequence
    ///   cannot be written back
    /// - `Error::Corrupted` if the slot holds something other than an entry sequence
    pub fn open(config: StoreConfig, backend: Arc<dyn PersistenceBackend>) -> Result<Self> {
        Self::open_with(
            config,
            backend,
            Arc::new(SystemClock),
            Arc::new(OsTokenGenerator),
        )
    }

    /// Opens the store with explicit collaborators
    pub fn open_with(
        config: StoreConfig,
        backend: Arc<dyn PersistenceBackend>,
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Result<Self> {
        config.validate()?;

        let mut store = Self {
            config,
            entries: Vec::new(),
            backend,
            clock,
            tokens,
        };
        store.load_entries()?;
        Ok(store)
    }

    /// Binds `payload` to a fresh token and returns the token
    ///
    /// A negative `ttl_seconds` uses the store's default TTL; 0 never expires.
    pub fn save(&mut self, payload: T, context: &str, ttl_seconds: i64) -> Result<String> {
        let ttl_seconds = u64::try_from(ttl_seconds).unwrap_or(self.config.default_ttl);
        let now = self.clock.now_secs();
        let token = self.unique_token(context, now)?;

        self.entries
            .push(Entry::create(token.clone(), payload, context, ttl_seconds, now));
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }

        tracing::debug!(
            "SAVE {} in '{}' (ttl {}s)",
            truncate_token_for_log(&token),
            context,
            ttl_seconds
        );
        Ok(token)
    }

    /// Replaces the payload bound to a live token
    ///
    /// `ttl_seconds` > 0 restarts the expiry from now, 0 makes the entry
    /// never expire, and a negative value keeps the current expiry.
    ///
    /// Returns `false` without writing if the token is unknown or expired.
    pub fn update(&mut self, token: &str, payload: T, context: &str, ttl_seconds: i64) -> Result<bool> {
        let now = self.clock.now_secs();
        let Some(index) = self.find(token, context, now) else {
            tracing::debug!("UPDATE {} in '{}': not found", truncate_token_for_log(token), context);
            return Ok(false);
        };

        let previous = self.entries[index].clone();
        self.entries[index].update(payload, ttl_seconds, now);
        if let Err(e) = self.persist() {
            self.entries[index] = previous;
            return Err(e);
        }

        tracing::debug!("UPDATE {} in '{}'", truncate_token_for_log(token), context);
        Ok(true)
    }

    /// Checks if a token is bound and not expired
    #[must_use]
    pub fn exists(&self, token: &str, context: &str) -> bool {
        self.find(token, context, self.clock.now_secs()).is_some()
    }

    /// Returns a copy of the payload bound to a live token
    ///
    /// This is a pure read: the entry stays in place and nothing is written.
    /// Use [`take`](Self::take) to consume the token.
    pub fn load(&self, token: &str, context: &str) -> Option<T> {
        self.peek(token, context).cloned()
    }

    /// Borrows the payload bound to a live token
    pub fn peek(&self, token: &str, context: &str) -> Option<&T> {
        let index = self.find(token, context, self.clock.now_secs())?;
        Some(self.entries[index].payload())
    }

    /// Removes a live token and returns its payload
    ///
    /// The removal is written to the backend before returning.
    pub fn take(&mut self, token: &str, context: &str) -> Result<Option<T>> {
        let Some(index) = self.find(token, context, self.clock.now_secs()) else {
            tracing::debug!("TAKE {} in '{}': not found", truncate_token_for_log(token), context);
            return Ok(None);
        };

        let entry = self.entries.remove(index);
        if let Err(e) = self.persist() {
            self.entries.insert(index, entry);
            return Err(e);
        }

        tracing::debug!("TAKE {} in '{}'", truncate_token_for_log(token), context);
        Ok(Some(entry.into_payload()))
    }

    /// Removes a live token, returning whether it was bound
    #[must_use = "returns whether the token was bound"]
    pub fn delete(&mut self, token: &str, context: &str) -> Result<bool> {
        Ok(self.take(token, context)?.is_some())
    }

    /// Index of the newest live entry bound to `token` within `context`
    fn find(&self, token: &str, context: &str, now: u64) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|entry| entry.matches(token, context, now))
    }

    /// Draws tokens until one is not bound to a live entry in `context`
    fn unique_token(&self, context: &str, now: u64) -> Result<String> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = generate_token(self.tokens.as_ref(), self.config.hash_size)?;
            if self.find(&token, context, now).is_none() {
                return Ok(token);
            }
            tracing::debug!("token collision in '{}', drawing again", context);
        }
        Err(Error::TokenCollision {
            attempts: MAX_TOKEN_ATTEMPTS,
        })
    }

    /// Reads the slot and evicts the expired older end of the sequence
    fn load_entries(&mut self) -> Result<()> {
        let name = &self.config.name;
        let bytes = self.backend.get(name).map_err(|source| Error::Backend {
            name: name.clone(),
            source,
        })?;

        let Some(bytes) = bytes else {
            tracing::debug!("OPEN '{}': empty slot", name);
            return Ok(());
        };

        let mut entries: Vec<Entry<T>> = serde_json::from_slice(&bytes).map_err(|source| {
            tracing::warn!("OPEN '{}': slot is corrupted: {}", name, source);
            Error::Corrupted {
                name: name.clone(),
                source,
            }
        })?;

        // Walking back from the newest entry, the first expired one marks
        // where everything older is treated as expired too.
        let now = self.clock.now_secs();
        let dropped = entries
            .iter()
            .rposition(|entry| entry.is_expired(now))
            .map_or(0, |index| index + 1);
        entries.drain(..dropped);
        self.entries = entries;

        if dropped > 0 {
            tracing::info!(
                "OPEN '{}': evicted {} expired entries, {} remain",
                self.config.name,
                dropped,
                self.entries.len()
            );
            self.persist()?;
        } else {
            tracing::debug!("OPEN '{}': {} entries", self.config.name, self.entries.len());
        }
        Ok(())
    }

    /// Writes the whole sequence to the backend
    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.entries).map_err(Error::Serialization)?;
        self.backend
            .put(&self.config.name, &bytes)
            .map_err(|source| Error::Backend {
                name: self.config.name.clone(),
                source,
            })
    }
}

impl<T> Store<T> {
    /// Returns the backend slot name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the number of entries held, including expired ones not yet evicted
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over held entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter()
    }
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .finish()
    }
}
