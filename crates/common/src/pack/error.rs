use crate::crypto::{CekError, KeyError};
use crate::encoding::EncodingError;

/// Errors that can occur while packing or unpacking an envelope
///
/// Every failure is terminal for the call that raised it; no partial
///  plaintext, content key or sender identity is ever returned alongside
///  an error.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Missing or invalid top level or header fields
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    /// The protected header names an `alg` we do not implement
    #[error("unsupported pack algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// None of the recipient blocks could be matched to a local key --
    ///  carries every `kid` that was tried
    #[error("no corresponding recipient key found in {0:?}")]
    KeyNotFound(Vec<String>),
    /// An authcrypt envelope resolved without a sender verkey
    #[error("sender verkey not provided for Authcrypt message")]
    MissingSenderIdentity,
    /// Authentication failed on the payload or on a wrapped key
    #[error("decryption failed")]
    DecryptionFailed,
    /// The same verkey was addressed more than once
    #[error("duplicate recipient: {0}")]
    DuplicateRecipient(String),
    /// Malformed key material, or a failure inside a key primitive
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    /// The injected key store failed to answer a lookup
    #[error("key store error: {0}")]
    KeyStore(#[source] anyhow::Error),
}

impl From<EncodingError> for PackError {
    fn from(err: EncodingError) -> Self {
        PackError::MalformedEnvelope(err.to_string())
    }
}

impl From<CekError> for PackError {
    fn from(err: CekError) -> Self {
        match err {
            CekError::Authentication => PackError::DecryptionFailed,
            CekError::Default(e) => PackError::MalformedEnvelope(e.to_string()),
        }
    }
}
