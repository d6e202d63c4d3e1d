//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Environment variable names recognised by cardseal.
pub mod vars {
    /// Path to the config file.
    pub const CONFIG: &str = "CARDSEAL_CONFIG";
    /// Overrides `group_id`.
    pub const GROUP_ID: &str = "CARDSEAL_GROUP_ID";
    /// Overrides `storage.container_root`.
    pub const CONTAINER_ROOT: &str = "CARDSEAL_CONTAINER_ROOT";
    /// Overrides `keystore.backend` (`keychain` or `file`).
    pub const KEYSTORE: &str = "CARDSEAL_KEYSTORE";
}
