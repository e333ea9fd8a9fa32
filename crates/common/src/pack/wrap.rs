//! Wrapping the content key for each recipient
//!
//! # Anoncrypt
//!
//! The content key is sealed to the recipient's X25519 key: a fresh
//! ephemeral keypair per block, so nothing about the sender is revealed.
//!
//! # Authcrypt
//!
//! 1. **Seal sender**: the sender's base58 verkey is sealed to the
//!    recipient, so only the recipient learns who sent the message
//! 2. **Box key**: the content key is `crypto_box`ed from the sender's
//!    X25519 secret to the recipient's X25519 public key under a fresh nonce
//!
//! Opening the box proves to the recipient that the holder of the sealed
//! verkey's secret produced the block.

use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::SalsaBox;
use rand::{CryptoRng, RngCore};

use super::error::PackError;
use super::header::{PackAlg, ProtectedHeader, RecipientBlock, RecipientHeader};
use crate::crypto::{ContentKey, KeyError, KeyPair, SigningSecret, VerKey};
use crate::encoding::b64_encode;

/// Size of the `crypto_box` (XSalsa20-Poly1305) nonce in bytes
pub const BOX_NONCE_SIZE: usize = 24;

/// Build the protected header carrying `cek` wrapped for every recipient
///
/// Blocks come out in the order the verkeys were given. An empty recipient
/// list yields a header with no blocks, which no one can open.
pub fn wrap_for_recipients<R: RngCore + CryptoRng>(
    rng: &mut R,
    cek: &ContentKey,
    recipients: &[VerKey],
    sender: Option<&SigningSecret>,
) -> Result<ProtectedHeader, PackError> {
    // Same derivation as keypair generation, so the verkey we seal is
    //  always the public half of the secret we box with
    let sender = sender
        .map(|secret| KeyPair::from_seed(&secret.seed()))
        .transpose()?;

    let mut blocks = Vec::with_capacity(recipients.len());
    for target_vk in recipients {
        let target_pk = target_vk.to_x25519()?;

        let block = match &sender {
            None => {
                let enc_cek = target_pk
                    .seal(rng, cek.bytes())
                    .map_err(|_| KeyError::from(anyhow::anyhow!("sealed box error")))?;
                RecipientBlock {
                    encrypted_key: b64_encode(enc_cek),
                    header: RecipientHeader::Anonymous {
                        kid: target_vk.to_base58(),
                    },
                }
            }
            Some(sender) => {
                let sender_vk = sender.public.to_base58();
                let enc_sender = target_pk
                    .seal(rng, sender_vk.as_bytes())
                    .map_err(|_| KeyError::from(anyhow::anyhow!("sealed box error")))?;

                let mut nonce = [0u8; BOX_NONCE_SIZE];
                rng.fill_bytes(&mut nonce);
                let enc_cek = SalsaBox::new(&target_pk, &sender.secret.to_x25519())
                    .encrypt(GenericArray::from_slice(&nonce), cek.bytes())
                    .map_err(|_| KeyError::from(anyhow::anyhow!("crypto box error")))?;

                RecipientBlock {
                    encrypted_key: b64_encode(enc_cek),
                    header: RecipientHeader::Authenticated {
                        kid: target_vk.to_base58(),
                        sender: b64_encode(enc_sender),
                        iv: b64_encode(nonce),
                    },
                }
            }
        };
        blocks.push(block);
    }

    let alg = if sender.is_some() {
        PackAlg::Authcrypt
    } else {
        PackAlg::Anoncrypt
    };
    tracing::trace!(%alg, recipients = blocks.len(), "wrapped content key");
    Ok(ProtectedHeader::new(alg, blocks))
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;

    use super::*;
    use crate::encoding::b64_decode;

    #[test]
    fn test_anoncrypt_blocks() {
        let cek = ContentKey::generate();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let header =
            wrap_for_recipients(&mut OsRng, &cek, &[alice.public, bob.public], None).unwrap();
        assert_eq!(header.alg().unwrap(), PackAlg::Anoncrypt);
        assert_eq!(header.recipients.len(), 2);
        assert_eq!(header.recipients[0].header.kid(), alice.public.to_base58());
        assert_eq!(header.recipients[1].header.kid(), bob.public.to_base58());
        for block in &header.recipients {
            assert!(!block.header.is_authenticated());
            // sealed box: 32 byte ephemeral key + 16 byte tag + 32 byte cek
            assert_eq!(b64_decode(&block.encrypted_key).unwrap().len(), 80);
        }
    }

    #[test]
    fn test_authcrypt_blocks() {
        let cek = ContentKey::generate();
        let sender = KeyPair::generate();
        let bob = KeyPair::generate();

        let header =
            wrap_for_recipients(&mut OsRng, &cek, &[bob.public], Some(&sender.secret)).unwrap();
        assert_eq!(header.alg().unwrap(), PackAlg::Authcrypt);
        match &header.recipients[0].header {
            RecipientHeader::Authenticated { kid, sender, iv } => {
                assert_eq!(kid, &bob.public.to_base58());
                assert_eq!(b64_decode(iv).unwrap().len(), BOX_NONCE_SIZE);
                assert!(!b64_decode(sender).unwrap().is_empty());
            }
            other => panic!("expected authenticated header, got {:?}", other),
        }
        // box: 16 byte tag + 32 byte cek
        assert_eq!(
            b64_decode(&header.recipients[0].encrypted_key).unwrap().len(),
            48
        );
    }

    #[test]
    fn test_no_recipients() {
        let cek = ContentKey::generate();
        let header = wrap_for_recipients(&mut OsRng, &cek, &[], None).unwrap();
        assert!(header.recipients.is_empty());
        assert_eq!(header.alg().unwrap(), PackAlg::Anoncrypt);
    }

    #[test]
    fn test_invalid_recipient_key() {
        let cek = ContentKey::generate();
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let result = wrap_for_recipients(&mut OsRng, &cek, &[VerKey::from(identity)], None);
        assert!(matches!(result, Err(PackError::Key(_))));
    }

    #[test]
    fn test_fresh_randomness_per_block() {
        let cek = ContentKey::generate();
        let sender = KeyPair::generate();
        let bob = KeyPair::generate();

        let a = wrap_for_recipients(&mut OsRng, &cek, &[bob.public], Some(&sender.secret)).unwrap();
        let b = wrap_for_recipients(&mut OsRng, &cek, &[bob.public], Some(&sender.secret)).unwrap();
        assert_ne!(a.recipients[0], b.recipients[0]);
    }
}
