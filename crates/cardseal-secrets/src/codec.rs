//! Plaintext encoding of a [`CardToken`].
//!
//! The payload is `number|expiration|cvv` in UTF-8.

use zeroize::Zeroizing;

use crate::error::{Result, SealError};
use crate::types::CardToken;

/// Field separator. Must not appear inside any field.
pub const DELIMITER: char = '|';

/// Encode the token as a plaintext payload.
///
/// Fields are not validated here; see [`crate::SecretPipeline::seal`].
pub fn encode(token: &CardToken) -> Zeroizing<Vec<u8>> {
    let [(_, number), (_, expiration), (_, cvv)] = token.fields();

    let mut payload = Zeroizing::new(Vec::with_capacity(
        number.len() + expiration.len() + cvv.len() + 2,
    ));
    payload.extend_from_slice(number.expose_secret().as_bytes());
    payload.push(DELIMITER as u8);
    payload.extend_from_slice(expiration.expose_secret().as_bytes());
    payload.push(DELIMITER as u8);
    payload.extend_from_slice(cvv.expose_secret().as_bytes());
    payload
}

/// Decode a payload produced by [`encode`].
///
/// Fails with [`SealError::MalformedPayload`] unless the payload is UTF-8
/// with exactly two delimiters.
pub fn decode(payload: &[u8]) -> Result<CardToken> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| SealError::MalformedPayload("payload is not valid UTF-8".to_string()))?;

    let delimiters = text.matches(DELIMITER).count();
    if delimiters != 2 {
        return Err(SealError::MalformedPayload(format!(
            "expected 2 delimiters, found {delimiters}"
        )));
    }

    let mut parts = text.splitn(3, DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(number), Some(expiration), Some(cvv)) => {
            Ok(CardToken::new(number, expiration, cvv))
        }
        _ => Err(SealError::MalformedPayload("missing field".to_string())),
    }
}
