//! Configuration schema definitions.

use crate::error::ConfigError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default shared group identifier.
pub const DEFAULT_GROUP_ID: &str = "group.cardseal.widget";

/// Default key-store account under which the symmetric key is stored.
pub const DEFAULT_ACCOUNT_ID: &str = "encryptionKey";

/// Default name of the sealed artifact inside the group container.
pub const DEFAULT_BLOB_NAME: &str = "encryptedCardToken";

/// Main cardseal configuration.
///
/// The writer and the reader must load the same `group_id` and
/// `account_id`, otherwise the reader resolves a different key or
/// container and every unseal fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared access group for the key record and the blob container.
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Account identifier of the key record.
    #[serde(default = "default_account_id")]
    pub account_id: String,

    /// File name of the sealed token inside the container.
    #[serde(default = "default_blob_name")]
    pub blob_name: String,

    /// Shared container settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key store backend settings.
    #[serde(default)]
    pub keystore: KeyStoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_id: default_group_id(),
            account_id: default_account_id(),
            blob_name: default_blob_name(),
            storage: StorageConfig::default(),
            keystore: KeyStoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Root directory under which group containers are resolved.
    pub fn container_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.container_root {
            Some(root) => Ok(paths::expand_tilde(root)),
            None => paths::containers_dir(),
        }
    }

    /// Directory used by the file key store backend.
    pub fn keys_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.keystore.dir {
            Some(dir) => Ok(paths::expand_tilde(dir)),
            None => paths::keys_dir(),
        }
    }
}

fn default_group_id() -> String {
    DEFAULT_GROUP_ID.to_string()
}

fn default_account_id() -> String {
    DEFAULT_ACCOUNT_ID.to_string()
}

fn default_blob_name() -> String {
    DEFAULT_BLOB_NAME.to_string()
}

/// Shared container configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the group containers (default `~/.cardseal/containers`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_root: Option<PathBuf>,
}

/// Key store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyStoreConfig {
    /// Which protected store holds the key.
    #[serde(default)]
    pub backend: KeyBackend,

    /// Directory for the `file` backend (default `~/.cardseal/keys`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Protected key store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    /// macOS login keychain.
    Keychain,
    /// Owner-only files under `keystore.dir`.
    File,
}

impl Default for KeyBackend {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Keychain
        } else {
            Self::File
        }
    }
}

impl std::str::FromStr for KeyBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" => Ok(Self::Keychain),
            "file" => Ok(Self::File),
            other => Err(ConfigError::Parse(format!(
                "unknown key store backend '{other}' (expected 'keychain' or 'file')"
            ))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
