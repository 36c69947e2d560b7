//! One-time math challenge on top of hash2data.
//!
//! `ask` prints a question and the token bound to its answer. `answer`
//! consumes the token and checks the response, so each question can be
//! answered once. The session lives in a directory between invocations.
//!
//! ```text
//! $ hash2data-math-question ask
//! 3 + 5 = ?
//! token: 9f86d081884c7d65...
//! $ hash2data-math-question answer 9f86d081884c7d65... 8
//! Correct answer!
//! ```

use anyhow::{bail, Context, Result};
use hash2data_core::{
    FileBackend, Store, StoreConfig, DEFAULT_HASH_SIZE, DEFAULT_STORE_NAME, INHERIT_TTL, NO_CONTEXT,
};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Questions left unanswered for this long stop being accepted
const DEFAULT_QUESTION_TTL: u64 = 300;

const USAGE: &str = "usage: hash2data-math-question ask | answer <token> <value>";

struct Settings {
    session_dir: PathBuf,
    store: StoreConfig,
}

impl Settings {
    /// Reads `HASH2DATA_*` environment variables
    fn from_env() -> Result<Self> {
        let session_dir = std::env::var("HASH2DATA_SESSION_DIR")
            .unwrap_or_else(|_| ".hash2data-session".to_string());
        let name = std::env::var("HASH2DATA_STORE_NAME")
            .unwrap_or_else(|_| DEFAULT_STORE_NAME.to_string());
        let default_ttl = env_number("HASH2DATA_DEFAULT_TTL", DEFAULT_QUESTION_TTL)?;
        let hash_size = env_number("HASH2DATA_HASH_SIZE", DEFAULT_HASH_SIZE)?;

        Ok(Self {
            session_dir: PathBuf::from(session_dir),
            store: StoreConfig::default()
                .with_name(name)
                .with_default_ttl(default_ttl)
                .with_hash_size(hash_size),
        })
    }
}

fn env_number<N>(var: &str, default: N) -> Result<N>
where
    N: std::str::FromStr,
    N::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{var} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hash2data_math_question=info,hash2data_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env()?;
    let backend = FileBackend::open(&settings.session_dir)
        .with_context(|| format!("cannot open session dir {}", settings.session_dir.display()))?;
    let mut store: Store<u32> = Store::open(settings.store, Arc::new(backend))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [cmd] if cmd == "ask" => ask(&mut store),
        [cmd, token, value] if cmd == "answer" => {
            println!("{}", answer(&mut store, token, value)?);
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

/// Draws a new question and binds its answer to a token
fn ask(store: &mut Store<u32>) -> Result<()> {
    let mut rng = rand::thread_rng();
    let a: u32 = rng.gen_range(1..=9);
    let b: u32 = rng.gen_range(1..=9);

    let token = store.save(a + b, NO_CONTEXT, INHERIT_TTL)?;
    tracing::info!("issued question, {} open in session", store.len());

    println!("{a} + {b} = ?");
    println!("token: {token}");
    Ok(())
}

/// Consumes the token and checks the response against the stored answer
fn answer(store: &mut Store<u32>, token: &str, value: &str) -> Result<&'static str> {
    let Some(expected) = store.take(token, NO_CONTEXT)? else {
        tracing::warn!("answer for unknown or expired token");
        return Ok("Error!");
    };

    if value.trim() == expected.to_string() {
        Ok("Correct answer!")
    } else {
        Ok("Wrong answer!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hash2data_core::MemoryBackend;

    fn create_test_store() -> Store<u32> {
        let config = StoreConfig::default().with_hash_size(16);
        Store::open(config, Arc::new(MemoryBackend::new())).unwrap()
    }

    #[test]
    fn test_correct_answer_consumes_token() {
        let mut store = create_test_store();
        let token = store.save(12, NO_CONTEXT, INHERIT_TTL).unwrap();

        assert_eq!(answer(&mut store, &token, "12").unwrap(), "Correct answer!");
        assert_eq!(answer(&mut store, &token, "12").unwrap(), "Error!");
    }

    #[test]
    fn test_wrong_answer_consumes_token() {
        let mut store = create_test_store();
        let token = store.save(4, NO_CONTEXT, INHERIT_TTL).unwrap();

        assert_eq!(answer(&mut store, &token, "5").unwrap(), "Wrong answer!");
        assert!(!store.exists(&token, NO_CONTEXT));
    }

    #[test]
    fn test_unknown_token() {
        let mut store = create_test_store();
        assert_eq!(answer(&mut store, "feedface", "1").unwrap(), "Error!");
    }

    #[test]
    fn test_answer_ignores_surrounding_whitespace() {
        let mut store = create_test_store();
        let token = store.save(9, NO_CONTEXT, INHERIT_TTL).unwrap();
        assert_eq!(answer(&mut store, &token, " 9\n").unwrap(), "Correct answer!");
    }

    #[test]
    fn test_ask_saves_one_question() {
        let mut store = create_test_store();
        ask(&mut store).unwrap();

        let entry = store.entries().next().unwrap();
        assert!((2..=18).contains(entry.payload()));
        assert_eq!(entry.token().len(), 16);
    }

    #[test]
    fn test_env_number_default() {
        let value: u64 = env_number("HASH2DATA_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
