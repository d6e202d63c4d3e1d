//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the cardseal base directory (~/.cardseal).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".cardseal"))
}

/// Get the main config file path (~/.cardseal/cardseal.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("cardseal.json5"))
}

/// Get the root under which group containers live (~/.cardseal/containers).
pub fn containers_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("containers"))
}

/// Get the file-backed key store directory (~/.cardseal/keys).
pub fn keys_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("keys"))
}

/// Ensure the base directory and its standard subdirectories exist.
///
/// On Unix every directory is restricted to the owner (0700).
pub fn ensure_dirs() -> Result<(), ConfigError> {
    let dirs = [base_dir()?, containers_dir()?, keys_dir()?];

    for dir in dirs {
        std::fs::create_dir_all(&dir)?;
        restrict_dir(&dir)?;
    }

    Ok(())
}

/// Set owner-only permissions on a directory. No-op off Unix.
pub fn restrict_dir(path: &Path) -> Result<(), std::io::Error> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Maximum length of a single identifier used as a path component.
pub const MAX_COMPONENT_LEN: usize = 128;

/// Validate that `name` is safe to use as a single path component.
///
/// Group ids, account ids and blob names all end up as file or directory
/// names. Allowed: ASCII alphanumeric, `.`, `_`, `-`; no leading dot.
pub fn validate_component(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("must not be empty".to_string());
    }
    if name.len() > MAX_COMPONENT_LEN {
        return Err(format!(
            "exceeds maximum length of {MAX_COMPONENT_LEN} characters"
        ));
    }
    if name.starts_with('.') {
        return Err(format!("must not start with '.': {name}"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(format!(
            "contains invalid characters (allowed: alphanumeric, '.', '_', '-'): {name}"
        ));
    }
    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
