use std::env;
use std::str::FromStr;
use tracing::warn;

/// Trait for types that can retrieve their configuration key from environment variables
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking environment variables first, then .env file
    fn find_key() -> Option<String> {
        // First try to load .env file (silently fail if not found)
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME).ok().filter(|k| !k.trim().is_empty())
    }

    /// True when a key is available without prompting anyone.
    fn has_key() -> bool {
        Self::find_key().is_some()
    }
}

/// Read `name` from the environment (after loading `.env`) and parse it.
///
/// Unparsable values are logged and ignored.
pub fn env_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let _ = dotenvy::dotenv();
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(variable = name, value = %raw, error = %e, "Ignoring unparsable environment value");
            None
        }
    }
}
