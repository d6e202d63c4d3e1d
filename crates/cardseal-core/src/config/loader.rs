//! Configuration loading and persistence.

use super::Config;
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("group_id", &self.group_id),
            ("account_id", &self.account_id),
            ("blob_name", &self.blob_name),
        ] {
            if let Err(reason) = paths::validate_component(value) {
                errors.push(format!("{field} {reason}"));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            ));
        }

        if let Some(root) = &self.storage.container_root {
            if root.as_os_str().is_empty() {
                errors.push("storage.container_root must not be empty".to_string());
            }
        }

        if let Some(dir) = &self.keystore.dir {
            if dir.as_os_str().is_empty() {
                errors.push("keystore.dir must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Apply `CARDSEAL_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(group_id) = env::get_var(env::vars::GROUP_ID) {
            debug!(group_id = %group_id, "group id overridden from environment");
            self.group_id = group_id;
        }
        if let Some(root) = env::get_var(env::vars::CONTAINER_ROOT) {
            self.storage.container_root = Some(PathBuf::from(root));
        }
        if let Some(backend) = env::get_var(env::vars::KEYSTORE) {
            self.keystore.backend = backend.parse()?;
        }
        Ok(())
    }

    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error. Environment overrides are applied and the result is
    /// validated.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::load_default() {
                Ok(config) => config,
                Err(ConfigError::NotFound(_)) => Self::default(),
                Err(e) => return Err(e),
            },
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }
}
