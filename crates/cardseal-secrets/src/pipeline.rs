//! End-to-end sealing of a [`CardToken`].
//!
//! Writer: validate, encode, load-or-create key, seal, write.
//! Reader: read, load-or-create key, open, decode.
//!
//! The writer and reader normally run in different processes; each builds
//! its own [`SecretPipeline`] from the same configuration and they meet only
//! through the key store record and the shared blob.

use std::sync::Arc;

use cardseal_core::Config;
use tracing::{debug, warn};

use crate::codec::{self, DELIMITER};
use crate::crypto;
use crate::error::{Result, SealError};
use crate::keychain::KeyStore;
use crate::store::{BlobStore, SharedBlobStore};
use crate::types::{CardToken, SealedBlob};

/// Seals card tokens for the reader and unseals them for display.
pub struct SecretPipeline {
    keys: KeyStore,
    blobs: Arc<dyn BlobStore>,
    group_id: String,
    blob_name: String,
}

impl SecretPipeline {
    /// Assemble a pipeline from explicit parts. The blob store is addressed
    /// with the key store's group id.
    pub fn new(keys: KeyStore, blobs: Arc<dyn BlobStore>, blob_name: impl Into<String>) -> Self {
        let group_id = keys.group_id().to_string();
        Self {
            keys,
            blobs,
            group_id,
            blob_name: blob_name.into(),
        }
    }

    /// Build the key store and blob store described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let keys = KeyStore::from_config(config)?;
        let root = config
            .container_root()
            .map_err(|e| SealError::ContainerUnavailable(e.to_string()))?;
        let blobs = Arc::new(SharedBlobStore::with_root(root));
        Ok(Self::new(keys, blobs, &config.blob_name))
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn blob_name(&self) -> &str {
        &self.blob_name
    }

    /// Encrypt `token` and replace the shared blob with it.
    ///
    /// Every field must be non-empty and free of the payload delimiter. On
    /// any error the previously stored blob, if any, is left untouched.
    pub async fn seal(&self, token: &CardToken) -> Result<()> {
        validate(token)?;

        let payload = codec::encode(token);
        let key = self.keys.load_or_create()?;
        let blob = crypto::seal(&key, &payload)?;
        drop(key);

        self.blobs
            .write(&self.group_id, &self.blob_name, blob.as_bytes())
            .await?;

        debug!(group = %self.group_id, name = %self.blob_name, "sealed card token");
        Ok(())
    }

    /// Read and decrypt the shared blob.
    ///
    /// Returns `Ok(None)` when nothing has been sealed yet. Nothing is
    /// cached: each call reads and decrypts afresh.
    pub async fn unseal(&self) -> Result<Option<CardToken>> {
        let bytes = match self.blobs.read(&self.group_id, &self.blob_name).await {
            Ok(bytes) => bytes,
            Err(SealError::NotFound(_)) => {
                debug!(group = %self.group_id, name = %self.blob_name, "no sealed token yet");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let key = self.keys.load_or_create()?;
        let payload = crypto::open(&key, &SealedBlob::from_bytes(bytes)).map_err(|e| {
            warn!(group = %self.group_id, name = %self.blob_name, "sealed token failed authentication");
            e
        })?;
        drop(key);

        codec::decode(&payload).map(Some)
    }
}

/// Reject tokens that could not round-trip through the codec.
fn validate(token: &CardToken) -> Result<()> {
    for (field, value) in token.fields() {
        if value.is_empty() {
            return Err(SealError::InvalidInput(format!("{field} must not be empty")));
        }
        if value.contains(DELIMITER) {
            return Err(SealError::InvalidInput(format!(
                "{field} must not contain '{DELIMITER}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keychain::{MemorySecretService, SecretService, ServiceError};
    use tempfile::TempDir;
    use zeroize::Zeroizing;

    const GROUP: &str = "group.test";
    const BLOB: &str = "encryptedCardToken";

    fn pipeline(service: &MemorySecretService, root: &std::path::Path) -> SecretPipeline {
        let keys = KeyStore::new(Arc::new(service.clone()), "encryptionKey", GROUP);
        let blobs = Arc::new(SharedBlobStore::with_root(root.to_path_buf()));
        SecretPipeline::new(keys, blobs, BLOB)
    }

    /// A key store that can be read but refuses every write.
    struct ReadOnlyService;

    impl SecretService for ReadOnlyService {
        fn get(
            &self,
            _account: &str,
            _group: &str,
        ) -> std::result::Result<Option<Zeroizing<Vec<u8>>>, ServiceError> {
            Ok(None)
        }

        fn put(
            &self,
            _account: &str,
            _group: &str,
            _secret: &[u8],
        ) -> std::result::Result<(), ServiceError> {
            Err(ServiceError("missing entitlement".to_string()))
        }
    }

    fn sample() -> CardToken {
        CardToken::new("4111111111111111", "12/29", "123")
    }

    #[tokio::test]
    async fn test_seal_then_unseal() {
        let tmp = TempDir::new().unwrap();
        let service = MemorySecretService::new();
        let p = pipeline(&service, tmp.path());

        p.seal(&sample()).await.unwrap();
        assert_eq!(p.unseal().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_unseal_before_seal_is_none() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&MemorySecretService::new(), tmp.path());
        assert!(p.unseal().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_fields_rejected() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&MemorySecretService::new(), tmp.path());

        for token in [
            CardToken::new("", "12/29", "123"),
            CardToken::new("4111", "", "123"),
            CardToken::new("4111", "12/29", ""),
        ] {
            assert!(matches!(
                p.seal(&token).await,
                Err(SealError::InvalidInput(_))
            ));
        }
        assert!(p.unseal().await.unwrap().is_none(), "nothing should be written");
    }

    #[tokio::test]
    async fn test_delimiter_in_field_rejected() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&MemorySecretService::new(), tmp.path());

        let err = p
            .seal(&CardToken::new("4111|1111", "12/29", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, SealError::InvalidInput(_)));
        assert!(err.to_string().contains("card number"));
    }

    #[tokio::test]
    async fn test_key_persist_failure_aborts_seal() {
        let tmp = TempDir::new().unwrap();
        let keys = KeyStore::new(Arc::new(ReadOnlyService), "encryptionKey", GROUP);
        let blobs = Arc::new(SharedBlobStore::with_root(tmp.path().to_path_buf()));
        let p = SecretPipeline::new(keys, blobs, BLOB);

        let err = p.seal(&sample()).await.unwrap_err();
        assert!(matches!(err, SealError::KeyPersistFailure(_)));
        assert!(err.is_fatal());
        assert!(p.unseal().await.unwrap().is_none(), "no blob should be written");
        assert!(!tmp.path().join(GROUP).join(BLOB).exists());
    }

    #[tokio::test]
    async fn test_failed_seal_keeps_previous_blob() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&MemorySecretService::new(), tmp.path());

        p.seal(&sample()).await.unwrap();
        assert!(p.seal(&CardToken::new("", "", "")).await.is_err());
        assert_eq!(p.unseal().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_reseal_overwrites() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&MemorySecretService::new(), tmp.path());

        p.seal(&sample()).await.unwrap();
        let replacement = CardToken::new("5500000000000004", "01/30", "987");
        p.seal(&replacement).await.unwrap();

        assert_eq!(p.unseal().await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_reader_with_other_key_store_fails_authentication() {
        let tmp = TempDir::new().unwrap();
        let writer = pipeline(&MemorySecretService::new(), tmp.path());
        let reader = pipeline(&MemorySecretService::new(), tmp.path());

        writer.seal(&sample()).await.unwrap();
        assert!(matches!(
            reader.unseal().await,
            Err(SealError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn test_accessors() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&MemorySecretService::new(), tmp.path());
        assert_eq!(p.group_id(), GROUP);
        assert_eq!(p.blob_name(), BLOB);
    }
}
