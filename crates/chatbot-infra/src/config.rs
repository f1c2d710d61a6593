//! Configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.chatbot/` unless
//! `CHATBOT_DATA_DIR` is set) into [`AppConfig`], falling back to defaults
//! when the file is missing or malformed. The Gemini API key comes from the
//! environment only.

use std::path::{Path, PathBuf};

use chatbot_types::config::AppConfig;
use secrecy::SecretString;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CHATBOT_DATA_DIR";

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set; export it before starting the server")]
    MissingApiKey,

    #[error("could not determine a home directory; set CHATBOT_DATA_DIR")]
    NoHomeDir,

    #[error("failed to create data directory {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the data directory: `$CHATBOT_DATA_DIR`, else `~/.chatbot`.
pub fn resolve_data_dir() -> Result<PathBuf, ConfigError> {
    data_dir_from(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from), dirs::home_dir())
}

fn data_dir_from(
    explicit: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    match explicit.filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => Ok(dir),
        None => home.map(|h| h.join(".chatbot")).ok_or(ConfigError::NoHomeDir),
    }
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(dir: &Path) -> Result<(), ConfigError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ConfigError::DataDir {
            path: dir.to_path_buf(),
            source,
        })
}

/// Load `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or malformed file: logs a warning, defaults.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Read the Gemini API key from the environment.
///
/// An empty value counts as missing.
pub fn require_api_key() -> Result<SecretString, ConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<SecretString, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
        _ => Err(ConfigError::MissingApiKey),
    }
}
