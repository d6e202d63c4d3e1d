//! Core types for sealing.
//!
//! [`SymmetricKey`] and [`CardToken`] hold secrets and never print them.
//! [`SealedBlob`] holds ciphertext only and is safe to move around.

use std::fmt;

use cardseal_core::{constant_time_eq, SecretString};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{KEY_SIZE, NONCE_SIZE};

/// A 256-bit AES key.
///
/// Not `Clone` and not serializable: the only copies are the one in the
/// protected key store and the one the [`crate::KeyStore`] hands to the
/// cipher for the duration of a call. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generate a new key from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Rebuild a key from stored bytes. Returns `None` unless `bytes` is
    /// exactly [`KEY_SIZE`] long.
    pub(crate) fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().ok()?;
        Some(Self { bytes })
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for SymmetricKey {}

/// A sealed token: `nonce || ciphertext || tag`.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedBlob(Vec<u8>);

impl SealedBlob {
    /// Wrap bytes read back from storage. No validation happens here;
    /// opening the blob is what authenticates it.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The nonce prefix (shorter if the blob itself is truncated).
    pub fn nonce(&self) -> &[u8] {
        &self.0[..self.0.len().min(NONCE_SIZE)]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SealedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedBlob").field("len", &self.0.len()).finish()
    }
}

impl AsRef<[u8]> for SealedBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The three card fields sealed together.
///
/// Each field is a [`SecretString`]; `Debug` shows nothing but the masked
/// card number.
#[derive(Clone, PartialEq, Eq)]
pub struct CardToken {
    card_number: SecretString,
    expiration: SecretString,
    cvv: SecretString,
}

impl CardToken {
    pub fn new(
        card_number: impl Into<SecretString>,
        expiration: impl Into<SecretString>,
        cvv: impl Into<SecretString>,
    ) -> Self {
        Self {
            card_number: card_number.into(),
            expiration: expiration.into(),
            cvv: cvv.into(),
        }
    }

    pub fn card_number(&self) -> &SecretString {
        &self.card_number
    }

    pub fn expiration(&self) -> &SecretString {
        &self.expiration
    }

    pub fn cvv(&self) -> &SecretString {
        &self.cvv
    }

    /// Field names paired with values, in payload order.
    pub(crate) fn fields(&self) -> [(&'static str, &SecretString); 3] {
        [
            ("card number", &self.card_number),
            ("expiration", &self.expiration),
            ("cvv", &self.cvv),
        ]
    }

    /// The card number with everything but the last four characters hidden,
    /// e.g. `**** 1111`.
    pub fn masked_number(&self) -> String {
        let number = self.card_number.expose_secret();
        let chars: Vec<char> = number.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let last4: String = chars[chars.len() - 4..].iter().collect();
        format!("**** {last4}")
    }
}

impl fmt::Debug for CardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardToken")
            .field("card_number", &self.masked_number())
            .field("expiration", &self.expiration)
            .field("cvv", &self.cvv)
            .finish()
    }
}
