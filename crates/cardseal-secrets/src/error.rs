//! Error types for sealing and unsealing.

use thiserror::Error;

/// Errors surfaced by the key store, cipher, blob store, codec and pipeline.
#[derive(Debug, Error)]
pub enum SealError {
    /// A card field was empty or contained the payload delimiter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The protected key store could not be read or written.
    #[error("Key store unavailable: {0}")]
    KeyStoreUnavailable(String),

    /// A fresh key was generated but could not be stored.
    ///
    /// Unrecoverable: see [`SealError::is_fatal`].
    #[error("Failed to persist encryption key: {0}")]
    KeyPersistFailure(String),

    /// The shared group container could not be resolved.
    #[error("Shared container unavailable: {0}")]
    ContainerUnavailable(String),

    /// No sealed artifact has been written yet.
    #[error("Sealed token not found: {0}")]
    NotFound(String),

    /// Wrong key, tampered blob, or corrupt data. Deliberately carries no
    /// detail about which.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The cipher itself failed while sealing.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SealError {
    /// Whether the caller must stop rather than retry.
    ///
    /// Only a key that was generated but never persisted qualifies: anything
    /// sealed under it would be unreadable by the other process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::KeyPersistFailure(_))
    }
}

/// Convenience result alias for sealing operations.
pub type Result<T> = std::result::Result<T, SealError>;
