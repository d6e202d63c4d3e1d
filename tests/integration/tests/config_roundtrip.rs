//! Config save/load roundtrip integration tests.
//!
//! A config written by the writer side must lead the reader side to the
//! same key record and container.

use cardseal_core::config::{Config, KeyBackend};
use cardseal_integration_tests::Sandbox;
use cardseal_secrets::CardToken;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cardseal.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.group_id, config.group_id);
    assert_eq!(loaded.account_id, config.account_id);
    assert_eq!(loaded.blob_name, config.blob_name);
    assert_eq!(loaded.keystore.backend, config.keystore.backend);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/cardseal.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
}

#[tokio::test]
async fn test_saved_config_drives_both_sides() {
    let sandbox = Sandbox::new();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cardseal.json5");
    sandbox.config.save(&path).unwrap();

    let writer_config = Config::load(&path).unwrap();
    let reader_config = Config::load(&path).unwrap();
    assert_eq!(reader_config.keystore.backend, KeyBackend::File);

    let token = CardToken::new("4111111111111111", "12/29", "123");
    cardseal_secrets::SecretPipeline::from_config(&writer_config)
        .unwrap()
        .seal(&token)
        .await
        .unwrap();

    let read = cardseal_secrets::SecretPipeline::from_config(&reader_config)
        .unwrap()
        .unseal()
        .await
        .unwrap();
    assert_eq!(read, Some(token));
}
