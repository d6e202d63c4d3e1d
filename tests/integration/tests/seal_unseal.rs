//! Writer/reader scenarios across separately built pipelines.
//!
//! The writer and reader never share in-process state: each test builds
//! them independently from the same configuration, so they meet only
//! through the key file and the sealed blob on disk.

use cardseal_integration_tests::Sandbox;
use cardseal_secrets::{CardToken, SealError};

fn visa() -> CardToken {
    CardToken::new("4111111111111111", "12/29", "123")
}

#[tokio::test]
async fn test_seal_in_writer_unseal_in_reader() {
    let sandbox = Sandbox::new();

    sandbox.process().seal(&visa()).await.unwrap();
    let token = sandbox.process().unseal().await.unwrap().unwrap();

    assert_eq!(token.card_number().expose_secret(), "4111111111111111");
    assert_eq!(token.expiration().expose_secret(), "12/29");
    assert_eq!(token.cvv().expose_secret(), "123");
}

#[tokio::test]
async fn test_corrupting_byte_five_fails_authentication() {
    let sandbox = Sandbox::new();
    sandbox.process().seal(&visa()).await.unwrap();

    let mut bytes = std::fs::read(sandbox.blob_path()).unwrap();
    bytes[5] ^= 0x01;
    std::fs::write(sandbox.blob_path(), &bytes).unwrap();

    assert!(matches!(
        sandbox.process().unseal().await,
        Err(SealError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn test_unseal_before_any_seal_is_empty() {
    let sandbox = Sandbox::new();
    assert!(sandbox.process().unseal().await.unwrap().is_none());
}

#[tokio::test]
async fn test_key_survives_across_processes() {
    let sandbox = Sandbox::new();

    // An empty read does not touch the key store.
    assert!(sandbox.process().unseal().await.unwrap().is_none());
    assert!(!sandbox.key_path().exists());

    sandbox.process().seal(&visa()).await.unwrap();
    let first_key = std::fs::read_to_string(sandbox.key_path()).unwrap();

    let replacement = CardToken::new("5500000000000004", "01/30", "987");
    sandbox.process().seal(&replacement).await.unwrap();
    assert_eq!(std::fs::read_to_string(sandbox.key_path()).unwrap(), first_key);
    assert_eq!(sandbox.process().unseal().await.unwrap(), Some(replacement));
}

#[tokio::test]
async fn test_blob_format_on_disk() {
    let sandbox = Sandbox::new();
    sandbox.process().seal(&visa()).await.unwrap();

    let bytes = std::fs::read(sandbox.blob_path()).unwrap();
    let payload_len = "4111111111111111|12/29|123".len();
    assert_eq!(bytes.len(), 12 + payload_len + 16);
    assert!(!bytes
        .windows(4)
        .any(|w| w == b"4111"), "plaintext must not appear on disk");
}

#[tokio::test]
async fn test_sealing_twice_changes_nonce() {
    let sandbox = Sandbox::new();
    let writer = sandbox.process();

    writer.seal(&visa()).await.unwrap();
    let first = std::fs::read(sandbox.blob_path()).unwrap();
    writer.seal(&visa()).await.unwrap();
    let second = std::fs::read(sandbox.blob_path()).unwrap();

    assert_ne!(first[..12], second[..12]);
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_replaced_key_rejects_old_blob() {
    let sandbox = Sandbox::new();
    sandbox.process().seal(&visa()).await.unwrap();

    std::fs::write(sandbox.key_path(), "00".repeat(32)).unwrap();

    assert!(matches!(
        sandbox.process().unseal().await,
        Err(SealError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn test_truncated_blob_fails_authentication() {
    let sandbox = Sandbox::new();
    sandbox.process().seal(&visa()).await.unwrap();

    std::fs::write(sandbox.blob_path(), [0u8; 10]).unwrap();

    assert!(matches!(
        sandbox.process().unseal().await,
        Err(SealError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn test_unprovisioned_container_root() {
    let mut sandbox = Sandbox::new();
    sandbox.config.storage.container_root = Some("/nonexistent/cardseal/containers".into());

    assert!(matches!(
        sandbox.process().seal(&visa()).await,
        Err(SealError::ContainerUnavailable(_))
    ));
    assert!(matches!(
        sandbox.process().unseal().await,
        Err(SealError::ContainerUnavailable(_))
    ));
}

#[tokio::test]
async fn test_different_groups_do_not_see_each_other() {
    let sandbox = Sandbox::new();
    sandbox.process().seal(&visa()).await.unwrap();

    let mut other = Sandbox::new();
    other.config.storage.container_root = sandbox.config.storage.container_root.clone();
    other.config.keystore.dir = sandbox.config.keystore.dir.clone();
    other.config.group_id = "group.someone.else".to_string();

    assert!(other.process().unseal().await.unwrap().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unwritable_key_directory_is_fatal() {
    let sandbox = Sandbox::new();
    let keys = sandbox.config.keys_dir().unwrap();
    std::fs::create_dir_all(&keys).unwrap();

    // A dangling link reads as "no key yet" but can't be created as a
    // directory, whatever the uid.
    let group_dir = keys.join(&sandbox.config.group_id);
    std::os::unix::fs::symlink(keys.join("missing").join("target"), &group_dir).unwrap();

    let err = sandbox.process().seal(&visa()).await.unwrap_err();
    assert!(matches!(err, SealError::KeyPersistFailure(_)));
    assert!(err.is_fatal());
    assert!(!sandbox.blob_path().exists());
    assert!(sandbox.process().unseal().await.unwrap().is_none());
}
