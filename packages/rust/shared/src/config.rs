//! Application configuration for Folio.
//!
//! User config lives at `~/.folio/folio.toml`.
//! Environment and CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::types::DEFAULT_AUTHOR;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "folio.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".folio";

/// Environment variable that overrides the configured database path.
pub const DB_PATH_ENV: &str = "FOLIO_DB_PATH";

// ---------------------------------------------------------------------------
// Config structs (matching folio.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Notion API settings.
    #[serde(default)]
    pub notion: NotionConfig,

    /// Database settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Author recorded when an ingest request leaves it blank.
    #[serde(default = "default_author")]
    pub author: String,

    /// How many times an insert that lost a slug race is re-allocated.
    #[serde(default = "default_slug_retry_limit")]
    pub slug_retry_limit: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            author: default_author(),
            slug_retry_limit: default_slug_retry_limit(),
        }
    }
}

fn default_author() -> String {
    DEFAULT_AUTHOR.into()
}
fn default_slug_retry_limit() -> u32 {
    5
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Name of the env var holding the integration token (never store the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API root, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Value sent in the `Notion-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "NOTION_KEY".into()
}
fn default_api_base_url() -> String {
    "https://api.notion.com/v1".into()
}
fn default_api_version() -> String {
    "2022-06-28".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; a leading `~/` expands to the home directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.folio/folio.db".into()
}

// ---------------------------------------------------------------------------
// Source config (runtime, merged from config + environment)
// ---------------------------------------------------------------------------

/// Runtime settings for the Notion client, with the token resolved.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Integration token.
    pub api_key: String,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// `Notion-Version` header value.
    pub api_version: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Build from the loaded config, reading the token from its env var.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Ok(Self {
            api_key,
            base_url: config.notion.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.notion.api_version.clone(),
            timeout_secs: config.notion.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.folio/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| FolioError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.folio/folio.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| FolioError::parse(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FolioError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FolioError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FolioError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the Notion token from the configured env var.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.notion.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(FolioError::config(format!(
            "Notion API key not found. Set the {var_name} environment variable.\n\
             Create an internal integration at https://www.notion.so/my-integrations"
        ))),
    }
}

/// Resolve the database path: `FOLIO_DB_PATH` wins over the config file.
pub fn database_path(config: &AppConfig) -> Result<PathBuf> {
    match std::env::var(DB_PATH_ENV) {
        Ok(val) if !val.trim().is_empty() => expand_home(val.trim()),
        _ => expand_home(&config.storage.database_path),
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| FolioError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
