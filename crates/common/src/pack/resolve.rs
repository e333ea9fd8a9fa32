use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::SalsaBox;

use super::error::PackError;
use super::header::{RecipientBlock, RecipientHeader};
use super::wrap::BOX_NONCE_SIZE;
use crate::crypto::{ContentKey, VerKey};
use crate::encoding::b64_decode;
use crate::keystore::KeyStore;

/// The result of locating our recipient block
#[derive(Debug, Clone)]
pub struct ResolvedKey {
    pub cek: ContentKey,
    /// base58 sender verkey, present only for authenticated blocks
    pub sender_verkey: Option<String>,
    /// base58 verkey of the block we opened
    pub recipient_verkey: String,
}

/// Find the first recipient block we hold a key for and unwrap its content key
///
/// Blocks are tried in order; the first `kid` the key store knows is the
/// one that gets opened, and scanning stops there whether or not the open
/// succeeds. If no `kid` is known, the error lists all of them.
pub async fn resolve<K>(recipients: &[RecipientBlock], keys: &K) -> Result<ResolvedKey, PackError>
where
    K: KeyStore + ?Sized,
{
    let mut not_found = Vec::new();
    for recip in recipients {
        let kid = recip.header.kid();
        let secret = keys
            .find_key(kid)
            .await
            .map_err(|e| PackError::KeyStore(anyhow::Error::new(e)))?;
        let Some(secret) = secret else {
            tracing::trace!(kid, "no local key for recipient block");
            not_found.push(kid.to_string());
            continue;
        };

        // the kid must at least be a well formed verkey
        VerKey::from_base58(kid)
            .map_err(|e| PackError::MalformedEnvelope(format!("invalid recipient kid: {}", e)))?;
        let sk = secret.to_x25519();
        let encrypted_key = b64_decode(&recip.encrypted_key)?;

        let (cek, sender_verkey) = match &recip.header {
            RecipientHeader::Authenticated { sender, iv, .. } => {
                let enc_sender = b64_decode(sender)?;
                let nonce = b64_decode(iv)?;
                if nonce.len() != BOX_NONCE_SIZE {
                    return Err(PackError::MalformedEnvelope(format!(
                        "invalid iv size, expected {}, got {}",
                        BOX_NONCE_SIZE,
                        nonce.len()
                    )));
                }

                let sender_vk_bin = sk
                    .unseal(&enc_sender)
                    .map_err(|_| PackError::DecryptionFailed)?;
                let sender_vk = String::from_utf8(sender_vk_bin).map_err(|_| {
                    PackError::MalformedEnvelope("sender verkey is not valid text".to_string())
                })?;
                let sender_pk = VerKey::from_base58(&sender_vk)
                    .and_then(|vk| vk.to_x25519())
                    .map_err(|e| {
                        PackError::MalformedEnvelope(format!("invalid sender verkey: {}", e))
                    })?;

                let cek = SalsaBox::new(&sender_pk, &sk)
                    .decrypt(GenericArray::from_slice(&nonce), encrypted_key.as_slice())
                    .map_err(|_| PackError::DecryptionFailed)?;
                (cek, Some(sender_vk))
            }
            RecipientHeader::Anonymous { .. } => {
                let cek = sk
                    .unseal(&encrypted_key)
                    .map_err(|_| PackError::DecryptionFailed)?;
                (cek, None)
            }
        };

        let cek = ContentKey::from_slice(&cek).map_err(|_| {
            PackError::MalformedEnvelope("unwrapped content key has wrong size".to_string())
        })?;
        tracing::debug!(
            kid,
            authenticated = sender_verkey.is_some(),
            "resolved recipient key"
        );
        return Ok(ResolvedKey {
            cek,
            sender_verkey,
            recipient_verkey: kid.to_string(),
        });
    }

    Err(PackError::KeyNotFound(not_found))
}
