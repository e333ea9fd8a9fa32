use std::collections::HashSet;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::error::PackError;
use super::header::{PackAlg, ProtectedHeader};
use super::resolve::resolve;
use super::wrap::wrap_for_recipients;
use crate::crypto::{ContentKey, SigningSecret, VerKey};
use crate::encoding::{b64_decode, b64_encode};
use crate::keystore::KeyStore;

/// The packed message as it crosses the transport boundary
///
/// All four fields are base64url. `protected` is the encoded
///  [`ProtectedHeader`] and doubles as the payload's associated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub protected: String,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}

impl Envelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackError> {
        serde_json::to_vec(self)
            .map_err(|e| PackError::MalformedEnvelope(format!("envelope encode error: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackError> {
        serde_json::from_slice(bytes)
            .map_err(|e| PackError::MalformedEnvelope(format!("invalid envelope: {}", e)))
    }
}

/// A successfully unpacked message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    pub message: String,
    /// base58 sender verkey; `None` for anoncrypt
    pub sender_verkey: Option<String>,
    /// base58 verkey of the local key that opened the envelope
    pub recipient_verkey: String,
}

/// Pack `message` for every verkey in `to_verkeys`
///
/// With a sender secret the envelope is Authcrypt, otherwise Anoncrypt.
pub fn pack(
    message: &str,
    to_verkeys: &[VerKey],
    from_secret: Option<&SigningSecret>,
) -> Result<Vec<u8>, PackError> {
    pack_with_rng(&mut OsRng, message, to_verkeys, from_secret)
}

/// [`pack`] drawing every key, nonce and ephemeral secret from `rng`
pub fn pack_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    message: &str,
    to_verkeys: &[VerKey],
    from_secret: Option<&SigningSecret>,
) -> Result<Vec<u8>, PackError> {
    let mut seen = HashSet::with_capacity(to_verkeys.len());
    for verkey in to_verkeys {
        if !seen.insert(verkey) {
            return Err(PackError::DuplicateRecipient(verkey.to_base58()));
        }
    }

    let cek = ContentKey::generate_with_rng(rng);
    let header = wrap_for_recipients(rng, &cek, to_verkeys, from_secret)?;
    let protected = header.encode()?;

    let sealed = cek.encrypt_with_rng(rng, message.as_bytes(), protected.as_bytes())?;

    let envelope = Envelope {
        protected,
        iv: b64_encode(sealed.nonce),
        ciphertext: b64_encode(&sealed.ciphertext),
        tag: b64_encode(sealed.tag),
    };
    tracing::debug!(
        alg = %header.alg,
        recipients = to_verkeys.len(),
        "packed message"
    );
    envelope.to_bytes()
}

/// Open an envelope with whichever local key it was addressed to
///
/// The raw `protected` string, not a re-serialization of the parsed
/// header, is what gets authenticated against the payload tag.
pub async fn unpack<K>(enc_message: &[u8], keys: &K) -> Result<Unpacked, PackError>
where
    K: KeyStore + ?Sized,
{
    let envelope = Envelope::from_bytes(enc_message)?;
    let header = ProtectedHeader::decode(&envelope.protected)?;

    let alg = header.alg()?;
    header.check_unique_kids()?;

    let resolved = resolve(&header.recipients, keys).await?;
    match (alg, &resolved.sender_verkey) {
        (PackAlg::Authcrypt, None) => return Err(PackError::MissingSenderIdentity),
        (PackAlg::Anoncrypt, Some(_)) => {
            return Err(PackError::MalformedEnvelope(
                "sender present in Anoncrypt envelope".to_string(),
            ))
        }
        _ => {}
    }

    let mut payload = b64_decode(&envelope.ciphertext)?;
    let nonce = b64_decode(&envelope.iv)?;
    let tag = b64_decode(&envelope.tag)?;
    payload.extend_from_slice(&tag);

    let plaintext = resolved
        .cek
        .decrypt(&payload, envelope.protected.as_bytes(), &nonce)?;
    let message = String::from_utf8(plaintext)
        .map_err(|_| PackError::MalformedEnvelope("payload is not valid UTF-8".to_string()))?;

    tracing::debug!(%alg, recipient = %resolved.recipient_verkey, "unpacked message");
    Ok(Unpacked {
        message,
        sender_verkey: resolved.sender_verkey,
        recipient_verkey: resolved.recipient_verkey,
    })
}
