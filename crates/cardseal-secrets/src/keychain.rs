//! Protected storage for the long-lived symmetric key.
//!
//! [`KeyStore`] implements load-or-create on top of a [`SecretService`],
//! the capability-scoped key/value store the host platform provides:
//!
//! - [`KeychainSecretService`]: macOS login keychain (macOS only)
//! - [`FileSecretService`]: owner-only files, for Linux and tests
//! - [`MemorySecretService`]: in-process, for tests and embedding
//!
//! Both the writer and the reader must ask for the same
//! `(account_id, group_id)` pair. Who may read the record is the
//! backend's business.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cardseal_core::config::{Config, KeyBackend};
use cardseal_core::paths;
use parking_lot::Mutex;
use tracing::{debug, error};
use zeroize::Zeroizing;

use crate::crypto::KEY_SIZE;
use crate::error::{Result, SealError};
use crate::types::SymmetricKey;

/// Failure reported by a [`SecretService`] backend.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

/// A protected key/value store scoped by account and access group.
pub trait SecretService: Send + Sync {
    /// Read the record for `(account, group)`. `Ok(None)` means no record
    /// exists; every other failure is an error.
    fn get(
        &self,
        account: &str,
        group: &str,
    ) -> std::result::Result<Option<Zeroizing<Vec<u8>>>, ServiceError>;

    /// Store `secret` under `(account, group)`, replacing any existing record.
    fn put(&self, account: &str, group: &str, secret: &[u8])
        -> std::result::Result<(), ServiceError>;
}

/// Loads the shared symmetric key, creating it on first use.
pub struct KeyStore {
    service: Arc<dyn SecretService>,
    account_id: String,
    group_id: String,
}

impl KeyStore {
    pub fn new(
        service: Arc<dyn SecretService>,
        account_id: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            account_id: account_id.into(),
            group_id: group_id.into(),
        }
    }

    /// Build a key store using the backend selected in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let service: Arc<dyn SecretService> = match config.keystore.backend {
            KeyBackend::Keychain => keychain_service()?,
            KeyBackend::File => {
                let dir = config
                    .keys_dir()
                    .map_err(|e| SealError::KeyStoreUnavailable(e.to_string()))?;
                Arc::new(FileSecretService::new(dir))
            }
        };
        Ok(Self::new(service, &config.account_id, &config.group_id))
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Return the stored key, generating and persisting one if none exists.
    ///
    /// - a stored record of the wrong length is [`SealError::KeyStoreUnavailable`]
    /// - any read failure other than "not found" is [`SealError::KeyStoreUnavailable`]
    /// - a new key that cannot be stored is [`SealError::KeyPersistFailure`];
    ///   the key is dropped and never used
    pub fn load_or_create(&self) -> Result<SymmetricKey> {
        match self.service.get(&self.account_id, &self.group_id) {
            Ok(Some(bytes)) => {
                debug!(account = %self.account_id, group = %self.group_id, "loaded encryption key");
                SymmetricKey::from_slice(&bytes).ok_or_else(|| {
                    SealError::KeyStoreUnavailable(format!(
                        "stored key for account '{}' has wrong length: {} (expected {KEY_SIZE})",
                        self.account_id,
                        bytes.len()
                    ))
                })
            }
            Ok(None) => {
                debug!(account = %self.account_id, group = %self.group_id, "generating new encryption key");
                let key = SymmetricKey::generate();
                self.service
                    .put(&self.account_id, &self.group_id, key.as_bytes())
                    .map_err(|e| {
                        error!(
                            account = %self.account_id,
                            group = %self.group_id,
                            "could not persist new encryption key: {e}"
                        );
                        SealError::KeyPersistFailure(e.to_string())
                    })?;
                Ok(key)
            }
            Err(e) => Err(SealError::KeyStoreUnavailable(format!(
                "key store read failed: {e}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// macOS keychain
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
fn keychain_service() -> Result<Arc<dyn SecretService>> {
    Ok(Arc::new(KeychainSecretService))
}

#[cfg(not(target_os = "macos"))]
fn keychain_service() -> Result<Arc<dyn SecretService>> {
    Err(SealError::KeyStoreUnavailable(
        "the keychain backend is only available on macOS; set keystore.backend = \"file\""
            .to_string(),
    ))
}

/// Generic-password items in the login keychain.
///
/// The group id is the item's service and the account id its account, so
/// every process signed into the same group sees the same item.
#[cfg(target_os = "macos")]
pub struct KeychainSecretService;

#[cfg(target_os = "macos")]
const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;

#[cfg(target_os = "macos")]
impl SecretService for KeychainSecretService {
    fn get(
        &self,
        account: &str,
        group: &str,
    ) -> std::result::Result<Option<Zeroizing<Vec<u8>>>, ServiceError> {
        use security_framework::passwords::get_generic_password;

        match get_generic_password(group, account) {
            Ok(data) => Ok(Some(Zeroizing::new(data))),
            Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(None),
            Err(e) => Err(ServiceError(format!("keychain read failed: {e}"))),
        }
    }

    fn put(
        &self,
        account: &str,
        group: &str,
        secret: &[u8],
    ) -> std::result::Result<(), ServiceError> {
        use security_framework::passwords::set_generic_password;

        set_generic_password(group, account, secret)
            .map_err(|e| ServiceError(format!("keychain write failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Hex-encoded key files at `{dir}/{group}/{account}.key`.
///
/// Directories are created `0700` and files `0600` on Unix. Records are
/// replaced with write-to-temp-then-rename.
pub struct FileSecretService {
    dir: PathBuf,
}

impl FileSecretService {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn record_path(&self, account: &str, group: &str) -> std::result::Result<PathBuf, ServiceError> {
        paths::validate_component(group).map_err(|e| ServiceError(format!("group id {e}")))?;
        paths::validate_component(account)
            .map_err(|e| ServiceError(format!("account id {e}")))?;
        Ok(self.dir.join(group).join(format!("{account}.key")))
    }
}

impl SecretService for FileSecretService {
    fn get(
        &self,
        account: &str,
        group: &str,
    ) -> std::result::Result<Option<Zeroizing<Vec<u8>>>, ServiceError> {
        let path = self.record_path(account, group)?;
        let encoded = match fs::read_to_string(&path) {
            Ok(s) => Zeroizing::new(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let bytes = hex::decode(encoded.trim())
            .map_err(|e| ServiceError(format!("{} is not valid hex: {e}", path.display())))?;
        Ok(Some(Zeroizing::new(bytes)))
    }

    fn put(
        &self,
        account: &str,
        group: &str,
        secret: &[u8],
    ) -> std::result::Result<(), ServiceError> {
        let path = self.record_path(account, group)?;
        let parent = path
            .parent()
            .ok_or_else(|| ServiceError(format!("{} has no parent", path.display())))?;
        // Only directories created here are narrowed to 0700; an existing
        // keystore root keeps the mode its owner gave it.
        let new_root = !self.dir.exists();
        fs::create_dir_all(parent)?;
        if new_root {
            paths::restrict_dir(&self.dir)?;
        }
        paths::restrict_dir(parent)?;

        let encoded = Zeroizing::new(hex::encode(secret));
        let tmp = parent.join(format!(".{account}.{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = write_private_file(&tmp, encoded.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %path.display(), "stored key record");
        Ok(())
    }
}

/// Create `path` with mode 0600 on Unix, write `data`, and flush to disk.
fn write_private_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// An in-process secret service.
///
/// Clones share the same records, so two [`KeyStore`]s built from clones
/// behave like two processes sharing one keychain.
#[derive(Clone, Default)]
pub struct MemorySecretService {
    records: Arc<Mutex<HashMap<(String, String), Zeroizing<Vec<u8>>>>>,
}

impl MemorySecretService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretService for MemorySecretService {
    fn get(
        &self,
        account: &str,
        group: &str,
    ) -> std::result::Result<Option<Zeroizing<Vec<u8>>>, ServiceError> {
        Ok(self
            .records
            .lock()
            .get(&(account.to_string(), group.to_string()))
            .cloned())
    }

    fn put(
        &self,
        account: &str,
        group: &str,
        secret: &[u8],
    ) -> std::result::Result<(), ServiceError> {
        self.records.lock().insert(
            (account.to_string(), group.to_string()),
            Zeroizing::new(secret.to_vec()),
        );
        Ok(())
    }
}
