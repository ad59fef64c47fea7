//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Key the cart blob is stored under (default: `@GoMarketplace:products`)
//! - `CART_STORAGE_DIR` - Directory used by the file-backed store (default: `.gomarket`)
//! - `CART_WRITE_RETRIES` - Extra attempts for a failed write (default: 2)
//! - `CART_RETRY_BACKOFF_MS` - Base delay between write attempts in milliseconds (default: 50)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Key the cart is persisted under unless overridden.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:products";

const DEFAULT_STORAGE_DIR: &str = ".gomarket";
const DEFAULT_WRITE_RETRIES: u32 = 2;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Environment variable {0} must not be empty")]
    EmptyEnvVar(String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key the serialized cart is stored under
    pub storage_key: String,
    /// Directory for the file-backed store
    pub storage_dir: PathBuf,
    /// Extra attempts after a failed write
    pub write_retries: u32,
    /// Base delay between write attempts; grows linearly per attempt
    pub retry_backoff: Duration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            write_retries: DEFAULT_WRITE_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but empty or not a number
    /// where one is expected.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`CartConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_key = match lookup("CART_STORAGE_KEY") {
            Some(key) if key.trim().is_empty() => {
                return Err(ConfigError::EmptyEnvVar("CART_STORAGE_KEY".to_string()));
            }
            Some(key) => key,
            None => DEFAULT_STORAGE_KEY.to_string(),
        };

        let storage_dir = lookup("CART_STORAGE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let write_retries = parse_or_default(&lookup, "CART_WRITE_RETRIES", DEFAULT_WRITE_RETRIES)?;
        let backoff_ms =
            parse_or_default(&lookup, "CART_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS)?;

        Ok(Self {
            storage_key,
            storage_dir,
            write_retries,
            retry_backoff: Duration::from_millis(backoff_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a numeric variable, falling back to a default when unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
