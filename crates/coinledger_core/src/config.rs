//! Runtime configuration for hosts embedding the ledger.
//!
//! # Responsibility
//! - Collect database, authentication and logging settings in one struct.
//! - Load them from `COINLEDGER_*` environment variables.
//!
//! # Invariants
//! - The token signing secret has no default and must be non-empty.
//! - Numeric settings are validated at load time, not at first use.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "COINLEDGER_";
const DEFAULT_DB_PATH: &str = "coinledger.sqlite3";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Argon2id cost parameters used to hash account credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Settings consumed by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_secs: u64,
    pub password_hashing: PasswordHashingConfig,
}

impl AuthConfig {
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            password_hashing: PasswordHashingConfig::default(),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Full process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub auth: AuthConfig,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
}

impl LedgerConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which receives full variable names
    /// such as `COINLEDGER_DB_PATH`.
    ///
    /// # Errors
    /// - `MissingVar` when `COINLEDGER_TOKEN_SECRET` is absent or blank.
    /// - `InvalidVar` when a numeric variable does not parse or is zero.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let token_secret = get("TOKEN_SECRET").ok_or(ConfigError::MissingVar("TOKEN_SECRET"))?;
        let defaults = PasswordHashingConfig::default();

        Ok(Self {
            database_path: get("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            busy_timeout_ms: parse_positive(&get, "BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS)?,
            auth: AuthConfig {
                token_secret,
                token_ttl_secs: parse_positive(&get, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
                password_hashing: PasswordHashingConfig {
                    memory_kib: parse_positive(&get, "HASH_MEMORY_KIB", defaults.memory_kib)?,
                    iterations: parse_positive(&get, "HASH_ITERATIONS", defaults.iterations)?,
                    parallelism: parse_positive(&get, "HASH_PARALLELISM", defaults.parallelism)?,
                },
            },
            log_level: get("LOG_LEVEL").unwrap_or_else(|| crate::default_log_level().to_string()),
            log_dir: get("LOG_DIR"),
        })
    }
}

fn parse_positive<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else {
        return Ok(default);
    };
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidVar { name, value: raw }),
    }
}

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar { name: &'static str, value: String },
    /// Values that parse but are rejected by a consumer (e.g. Argon2 limits).
    Rejected(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(name) => write!(f, "missing required variable {ENV_PREFIX}{name}"),
            Self::InvalidVar { name, value } => {
                write!(f, "invalid value `{value}` for {ENV_PREFIX}{name}")
            }
            Self::Rejected(message) => write!(f, "rejected configuration: {message}"),
        }
    }
}

impl Error for ConfigError {}
