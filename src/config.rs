//! Configuration loader for the `birdmap-tracker` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). The data-source secret is resolved separately by
//! [`load_api_key`] so that a missing key degrades the service instead of
//! aborting startup.
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Result};

use crate::error::Error;

/// Environment variable holding the data-source secret.
pub const API_KEY_ENV: &str = "DETECTIONS_API_KEY";

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Parse an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Detections database connection string, without the secret.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Relation holding the detections.
    pub table: String,

    /// File read for the secret when `DETECTIONS_API_KEY` is unset.
    pub api_key_file: PathBuf,

    /// How long a fetched snapshot is reused.
    pub snapshot_ttl: Duration,

    /// Marker icon served at `/icon.png`.
    pub icon_path: PathBuf,

    /// Address the HTTP server binds to.
    pub listen_addr: String,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DETECTIONS_DATABASE_URL` – detections database connection string
///
/// Optional:
/// - `DETECTIONS_TABLE` – relation name (default: `detections`)
/// - `DETECTIONS_API_KEY_FILE` – secret file (default: `apikey.txt`)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `SNAPSHOT_TTL_SECS` – snapshot reuse window (default: 30)
/// - `ICON_PATH` – marker icon (default: `Icon.png`)
/// - `LISTEN_ADDR` – bind address (default: `0.0.0.0:8080`)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DETECTIONS_DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let ttl_secs = parse_env_u32!("SNAPSHOT_TTL_SECS", 30);
    let table = env_or!("DETECTIONS_TABLE", "detections");
    let api_key_file = PathBuf::from(env_or!("DETECTIONS_API_KEY_FILE", "apikey.txt"));
    let icon_path = PathBuf::from(env_or!("ICON_PATH", "Icon.png"));
    let listen_addr = env_or!("LISTEN_ADDR", "0.0.0.0:8080");

    if table.is_empty() {
        return Err(anyhow!("DETECTIONS_TABLE must not be empty"));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        table,
        api_key_file,
        snapshot_ttl: Duration::from_secs(u64::from(ttl_secs)),
        icon_path,
        listen_addr,
    })
}

/// Resolve the data-source secret.
///
/// A non-blank `env_value` wins; otherwise the trimmed contents of `path`.
pub fn load_api_key(env_value: Option<String>, path: &Path) -> Result<String, Error> {
    // ---
    if let Some(key) = env_value.map(|k| k.trim().to_string()) {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    match std::fs::read_to_string(path) {
        Ok(contents) if !contents.trim().is_empty() => Ok(contents.trim().to_string()),
        _ => Err(Error::MissingCredential {
            env_var: API_KEY_ENV,
            path: path.to_path_buf(),
        }),
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the password in the database URL, if one was given inline.
    pub fn log_config(&self) {
        // ---
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DETECTIONS_DATABASE_URL : {}", masked_db_url);
        tracing::info!("  DETECTIONS_TABLE        : {}", self.table);
        tracing::info!("  DETECTIONS_API_KEY_FILE : {}", self.api_key_file.display());
        tracing::info!("  DB_POOL_MAX             : {}", self.db_pool_max);
        tracing::info!("  SNAPSHOT_TTL_SECS       : {}", self.snapshot_ttl.as_secs());
        tracing::info!("  ICON_PATH               : {}", self.icon_path.display());
        tracing::info!("  LISTEN_ADDR             : {}", self.listen_addr);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn temp_key_file(name: &str, contents: &str) -> PathBuf {
        // ---
        let path = env::temp_dir().join(format!("birdmap-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_env_key_wins_over_file() {
        // ---
        let path = temp_key_file("env-wins", "from-file\n");
        let key = load_api_key(Some("  from-env ".into()), &path).unwrap();
        assert_eq!(key, "from-env");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_key_file_is_trimmed() {
        // ---
        let path = temp_key_file("trimmed", "  secret-key \n");
        assert_eq!(load_api_key(None, &path).unwrap(), "secret-key");
        assert_eq!(load_api_key(Some("   ".into()), &path).unwrap(), "secret-key");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_key_is_credential_error() {
        // ---
        let path = env::temp_dir().join("birdmap-definitely-missing-apikey.txt");
        let err = load_api_key(None, &path).unwrap_err();
        assert!(matches!(err, Error::MissingCredential { .. }));
        assert_eq!(err.kind(), "configuration");
    }
}
