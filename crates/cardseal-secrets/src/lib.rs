//! Card token sealing for cardseal.
//!
//! A writer process seals a card's number, expiry and CVV with AES-256-GCM
//! and drops the blob into a group-shared container; a reader process loads
//! the same key from the protected key store and unseals it.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod keychain;
pub mod pipeline;
pub mod store;
pub mod types;

pub use error::{Result, SealError};
pub use keychain::{FileSecretService, KeyStore, MemorySecretService, SecretService, ServiceError};
#[cfg(target_os = "macos")]
pub use keychain::KeychainSecretService;
pub use pipeline::SecretPipeline;
pub use store::{BlobStore, ContainerResolver, DirectoryContainerResolver, SharedBlobStore};
pub use types::{CardToken, SealedBlob, SymmetricKey};
