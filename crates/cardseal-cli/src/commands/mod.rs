//! CLI command implementations.

pub mod config;
pub mod seal;
pub mod show;
pub mod watch;

use std::path::Path;

use anyhow::Context;
use cardseal_core::Config;
use cardseal_secrets::{SealError, SecretPipeline};

/// Load the configuration and build the sealing pipeline it describes.
pub(crate) fn pipeline(config_path: Option<&Path>) -> anyhow::Result<SecretPipeline> {
    let config = Config::resolve(config_path).context("failed to load configuration")?;
    SecretPipeline::from_config(&config).context("failed to initialize the key store")
}

/// Wrap a pipeline error with a message suited to the user, keeping the
/// original error in the chain.
pub(crate) fn explain(err: SealError, action: &str) -> anyhow::Error {
    let hint = match &err {
        SealError::ContainerUnavailable(_) => {
            "the shared container is not provisioned; run `cardseal config init`".to_string()
        }
        SealError::AuthenticationFailed => format!(
            "failed to {action}: the saved card could not be verified with this key"
        ),
        _ => format!("failed to {action}"),
    };
    anyhow::Error::new(err).context(hint)
}
