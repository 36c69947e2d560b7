//! # hash2data Core
//!
//! Binds unguessable random tokens to session-scoped data, so a later
//! request presenting only the token can read or consume the data without
//! the data ever leaving server-controlled storage.
//!
//! ## Features
//!
//! - Tokens are lowercase hex drawn from the OS random source
//! - Optional contexts partition the token namespace
//! - Per-entry TTL, with expired entries evicted when the store opens
//! - The whole entry sequence is written back after every mutation
//! - Pluggable persistence backend, clock and random source
//!
//! ## Example
//!
//! ```rust
//! use hash2data_core::{MemoryBackend, Store, StoreConfig, INHERIT_TTL, NO_CONTEXT};
//! use std::sync::Arc;
//!
//! # fn main() -> hash2data_core::Result<()> {
//! // The backend stands in for the caller's session object
//! let session = MemoryBackend::new();
//!
//! let config = StoreConfig::default()
//!     .with_name("captcha")
//!     .with_default_ttl(300);
//! let mut store: Store<u32> = Store::open(config.clone(), Arc::new(session.clone()))?;
//!
//! // Hand the token to the client, keep the answer
//! let token = store.save(7, NO_CONTEXT, INHERIT_TTL)?;
//!
//! // A later request reopens the store and consumes the token
//! let mut store: Store<u32> = Store::open(config, Arc::new(session))?;
//! assert_eq!(store.take(&token, NO_CONTEXT)?, Some(7));
//! assert_eq!(store.take(&token, NO_CONTEXT)?, None);
//! # Ok(())
//! # }
//! ```

mod backend;
mod clock;
mod config;
mod entry;
mod error;
mod store;
mod token;

pub use backend::{FileBackend, MemoryBackend, PersistenceBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{StoreConfig, DEFAULT_HASH_SIZE, DEFAULT_STORE_NAME};
pub use entry::Entry;
pub use error::{BackendError, Error, Result};
pub use store::{Store, INHERIT_TTL, MAX_TOKEN_ATTEMPTS, NEVER_EXPIRE, NO_CONTEXT};
pub use token::{generate_token, OsTokenGenerator, TokenGenerator, MAX_HASH_SIZE};
