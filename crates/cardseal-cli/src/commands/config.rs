//! Configuration management commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use cardseal_core::config::{Config, KeyBackend};
use cardseal_core::paths;
use clap::Args;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Write a config file and provision the container and key directories
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::resolve(config_path)?;
            println!("{}", config.to_json5()?);
        }

        ConfigCommand::Get { key } => {
            let config = Config::resolve(config_path)?;
            let json = serde_json::to_value(&config)?;

            match lookup(&json, &key) {
                Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
                None => anyhow::bail!("Key not found: {}", key),
            }
        }

        ConfigCommand::Set { key, value } => {
            let path = target_path(config_path)?;
            let config = if path.exists() {
                Config::load(&path)?
            } else {
                Config::default()
            };
            let mut json = serde_json::to_value(&config)?;
            assign(&mut json, &key, &value);

            // Deserialize back to Config to validate the shape is still correct
            let updated: Config = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid configuration after set: {}", e))?;
            updated.validate()?;
            updated.save(&path)?;

            println!("Set {} = {}", key, value);
        }

        ConfigCommand::Init { force } => {
            let path = target_path(config_path)?;

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }

            paths::ensure_dirs()?;

            let mut config = Config::default();
            config.apply_env_overrides()?;
            config.validate()?;
            provision(&config)?;
            config.save(&path)?;

            println!("Created config file: {}", path.display());
            println!("  Container root: {}", config.container_root()?.display());
            if config.keystore.backend == KeyBackend::File {
                println!("  Key directory:  {}", config.keys_dir()?.display());
            }
        }

        ConfigCommand::Path => {
            println!("{}", target_path(config_path)?.display());
        }

        ConfigCommand::Validate => match Config::resolve(config_path) {
            Ok(_) => println!("Configuration is valid"),
            Err(e) => anyhow::bail!("Configuration error: {}", e),
        },
    }

    Ok(())
}

/// The explicit `--config` path, or the default location.
fn target_path(config_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(paths::config_file()?),
    }
}

/// Create the container root and, for the file backend, the key directory.
fn provision(config: &Config) -> anyhow::Result<()> {
    let mut dirs = vec![config.container_root()?];
    if config.keystore.backend == KeyBackend::File {
        dirs.push(config.keys_dir()?);
    }
    for dir in dirs {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        paths::restrict_dir(&dir)?;
    }
    Ok(())
}

/// Walk a dot-separated key path.
fn lookup<'a>(json: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    key.split('.').try_fold(json, |acc, k| acc.get(k))
}

/// Set a dot-separated key path, creating intermediate objects as needed.
///
/// The value is parsed as JSON first (numbers, bools), falling back to a
/// plain string.
fn assign(json: &mut serde_json::Value, key: &str, value: &str) {
    let parts: Vec<&str> = key.split('.').collect();
    let mut current = json;
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 {
            let parsed: serde_json::Value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            current[part] = parsed;
        } else {
            if !current.get(part).map_or(false, |v| v.is_object()) {
                current[part] = serde_json::json!({});
            }
            current = &mut current[part];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup() {
        let json = serde_json::to_value(Config::default()).unwrap();

        let value = lookup(&json, "blob_name").unwrap();
        assert_eq!(value.as_str().unwrap(), "encryptedCardToken");
        assert!(lookup(&json, "logging.level").is_some());
        assert!(lookup(&json, "logging.missing").is_none());
    }

    #[test]
    fn test_assign_nested_and_back_to_config() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assign(&mut json, "storage.container_root", "/srv/containers");
        assign(&mut json, "keystore.backend", "file");

        let updated: Config = serde_json::from_value(json).unwrap();
        assert_eq!(
            updated.container_root().unwrap(),
            PathBuf::from("/srv/containers")
        );
        assert_eq!(updated.keystore.backend, KeyBackend::File);
    }

    #[test]
    fn test_assign_parses_json_values() {
        let mut json = serde_json::json!({});
        assign(&mut json, "a", "42");
        assign(&mut json, "b", "true");
        assign(&mut json, "c", "group.x");
        assert_eq!(json["a"], 42);
        assert_eq!(json["b"], true);
        assert_eq!(json["c"], "group.x");
    }

    #[test]
    fn test_provision_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.container_root = Some(tmp.path().join("containers"));
        config.keystore.backend = KeyBackend::File;
        config.keystore.dir = Some(tmp.path().join("keys"));

        provision(&config).unwrap();
        assert!(tmp.path().join("containers").is_dir());
        assert!(tmp.path().join("keys").is_dir());
    }

    #[tokio::test]
    async fn test_set_writes_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cardseal.json5");

        run(
            ConfigArgs {
                command: ConfigCommand::Set {
                    key: "group_id".to_string(),
                    value: "group.example".to_string(),
                },
            },
            Some(&path),
        )
        .await
        .unwrap();

        assert_eq!(Config::load(&path).unwrap().group_id, "group.example");
    }

    #[tokio::test]
    async fn test_set_rejects_invalid_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cardseal.json5");

        let result = run(
            ConfigArgs {
                command: ConfigCommand::Set {
                    key: "blob_name".to_string(),
                    value: "../escape".to_string(),
                },
            },
            Some(&path),
        )
        .await;
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
