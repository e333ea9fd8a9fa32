//! Text encodings used on the wire
//!
//! Binary envelope fields are base64url. We always emit the unpadded form,
//! but accept padded input as well since some peers still emit `=`.
//! Verification keys are carried as base58 (bitcoin alphabet).

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
}

/// Encode bytes as unpadded base64url
pub fn b64_encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(data)
}

/// Decode base64url, with or without trailing padding
pub fn b64_decode(data: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(URL_SAFE_LENIENT.decode(data)?)
}

pub fn b58_encode(data: impl AsRef<[u8]>) -> String {
    bs58::encode(data).into_string()
}

pub fn b58_decode(data: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(bs58::decode(data).into_vec()?)
}
