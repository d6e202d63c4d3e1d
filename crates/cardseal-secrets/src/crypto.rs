//! AES-256-GCM sealing of opaque payloads.
//!
//! A sealed blob is self-contained: `nonce (12) || ciphertext || tag (16)`.
//! There is no header and no associated data, so opening needs nothing but
//! the key. Every seal draws a fresh random nonce from the OS.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{Result, SealError};
use crate::types::{SealedBlob, SymmetricKey};

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;
pub const KEY_SIZE: usize = 32;

/// Shortest blob that can possibly open: an empty plaintext.
pub const MIN_BLOB_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Encrypt `plaintext` under `key`.
///
/// Fails only if the cipher itself fails, which indicates a bug rather
/// than bad input.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedBlob> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| SealError::EncryptionFailed(e.to_string()))?;

    // The returned buffer is ciphertext followed by the 16-byte tag.
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| SealError::EncryptionFailed(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);

    Ok(SealedBlob::from_bytes(blob))
}

/// Decrypt and authenticate a blob produced by [`seal`].
///
/// Truncated input, a wrong key and a tampered byte all produce the same
/// [`SealError::AuthenticationFailed`].
pub fn open(key: &SymmetricKey, blob: &SealedBlob) -> Result<Zeroizing<Vec<u8>>> {
    let bytes = blob.as_bytes();
    if bytes.len() < MIN_BLOB_LEN {
        return Err(SealError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| SealError::AuthenticationFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| SealError::AuthenticationFailed)
}
