//! Shared fixtures for the integration tests.
//!
//! A [`Sandbox`] is a temporary install: a provisioned container root and a
//! file-backed key directory. Each call to [`Sandbox::process`] builds a
//! fresh pipeline from configuration, the way a separate writer or reader
//! process would.

use std::path::PathBuf;

use cardseal_core::config::{Config, KeyBackend};
use cardseal_secrets::SecretPipeline;
use tempfile::TempDir;

pub struct Sandbox {
    dir: TempDir,
    pub config: Config,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let containers = dir.path().join("containers");
        std::fs::create_dir_all(&containers).expect("create container root");

        let mut config = Config::default();
        config.group_id = "group.cardseal.test".to_string();
        config.storage.container_root = Some(containers);
        config.keystore.backend = KeyBackend::File;
        config.keystore.dir = Some(dir.path().join("keys"));

        Self { dir, config }
    }

    /// A pipeline as seen by one process.
    pub fn process(&self) -> SecretPipeline {
        SecretPipeline::from_config(&self.config).expect("build pipeline")
    }

    /// Path of the sealed artifact on disk.
    pub fn blob_path(&self) -> PathBuf {
        self.dir
            .path()
            .join("containers")
            .join(&self.config.group_id)
            .join(&self.config.blob_name)
    }

    /// Path of the key record on disk.
    pub fn key_path(&self) -> PathBuf {
        self.dir
            .path()
            .join("keys")
            .join(&self.config.group_id)
            .join(format!("{}.key", self.config.account_id))
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
