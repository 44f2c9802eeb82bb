use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// Process configuration, read once at start-up from the environment
/// (after `.env` has been loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub database: String,
    pub collection: String,
    pub bind_addr: String,
    pub frontend_url: Option<String>,
    /// Deadline for each individual store call.
    pub store_timeout: Duration,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongo_uri = lookup("MONGO_URI")
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| Error::Config("No connection string (MONGO_URI)".to_string()))?;

        let store_timeout_secs: u64 = parse_or(&lookup, "STORE_TIMEOUT_SECS", 10)?;

        Ok(Self {
            mongo_uri,
            database: lookup("MONGO_DATABASE").unwrap_or_else(|| "CoinDB".to_string()),
            collection: lookup("MONGO_COLLECTION").unwrap_or_else(|| "Users".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            frontend_url: lookup("FRONTEND_URL").filter(|url| !url.is_empty()),
            store_timeout: Duration::from_secs(store_timeout_secs),
            hash_memory_kib: parse_or(&lookup, "HASH_MEMORY_KIB", argon2::Params::DEFAULT_M_COST)?,
            hash_iterations: parse_or(&lookup, "HASH_ITERATIONS", argon2::Params::DEFAULT_T_COST)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(default),
    }
}
