//! Content encryption using ChaCha20-Poly1305 (IETF)
//!
//! Every packed message gets its own `ContentKey`. The key encrypts the
//! message body exactly once, with the base64url protected header bound in
//! as associated data, and is then wrapped individually for each recipient.
//!
//! The AEAD output is split on the wire: `ciphertext` carries exactly as
//! many bytes as the plaintext, `tag` carries the trailing 16-byte
//! Poly1305 tag.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// Size of ChaCha20-Poly1305 IETF nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const CEK_SIZE: usize = 32;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during payload encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CekError {
    #[error("cek error: {0}")]
    Default(#[from] anyhow::Error),
    /// Tag mismatch: wrong key, wrong nonce, altered ciphertext or
    ///  altered associated data
    #[error("payload authentication failed")]
    Authentication,
}

/// The output of [`ContentKey::encrypt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
}

/// A 256-bit content encryption key
///
/// # Examples
///
/// ```
/// use common::crypto::ContentKey;
///
/// let cek = ContentKey::generate();
/// let sealed = cek.encrypt(b"ping", b"header").unwrap();
/// assert_eq!(sealed.ciphertext.len(), 4);
///
/// let mut payload = sealed.ciphertext.clone();
/// payload.extend_from_slice(&sealed.tag);
/// let plaintext = cek.decrypt(&payload, b"header", &sealed.nonce).unwrap();
/// assert_eq!(plaintext, b"ping");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey([u8; CEK_SIZE]);

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(..)")
    }
}

impl From<[u8; CEK_SIZE]> for ContentKey {
    fn from(bytes: [u8; CEK_SIZE]) -> Self {
        ContentKey(bytes)
    }
}

impl ContentKey {
    /// Generate a new random key using the OS CSPRNG
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut OsRng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut buff = [0; CEK_SIZE];
        rng.fill_bytes(&mut buff);
        Self(buff)
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `CEK_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CekError> {
        if data.len() != CEK_SIZE {
            return Err(anyhow::anyhow!(
                "invalid content key size, expected {}, got {}",
                CEK_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; CEK_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt a payload under a fresh random nonce, authenticating `aad`
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<SealedPayload, CekError> {
        self.encrypt_with_rng(&mut OsRng, plaintext, aad)
    }

    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<SealedPayload, CekError> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));

        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let mut output = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        if output.len() != plaintext.len() + TAG_SIZE {
            return Err(anyhow::anyhow!("unexpected AEAD output size").into());
        }
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&output[plaintext.len()..]);
        output.truncate(plaintext.len());

        Ok(SealedPayload {
            ciphertext: output,
            nonce,
            tag,
        })
    }

    /// Decrypt `ciphertext || tag`, authenticating `aad`
    ///
    /// The tag is checked before any plaintext is released; on mismatch
    /// nothing but [`CekError::Authentication`] comes back.
    pub fn decrypt(
        &self,
        ciphertext_and_tag: &[u8],
        aad: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, CekError> {
        if nonce.len() != NONCE_SIZE {
            return Err(anyhow::anyhow!(
                "invalid nonce size, expected {}, got {}",
                NONCE_SIZE,
                nonce.len()
            )
            .into());
        }
        if ciphertext_and_tag.len() < TAG_SIZE {
            return Err(CekError::Authentication);
        }

        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext_and_tag,
                    aad,
                },
            )
            .map_err(|_| CekError::Authentication)
    }
}
