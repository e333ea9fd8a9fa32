use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::encoding::{b58_decode, b58_encode, EncodingError};

/// Size of an Ed25519 seed in bytes
pub const SEED_SIZE: usize = 32;
/// Size of an Ed25519 verification key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Size of an Ed25519 signing secret (`seed || public`) in bytes
pub const SECRET_KEY_SIZE: usize = 64;
/// Size of a detached Ed25519 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("invalid seed size, expected 32, got {0}")]
    InvalidSeed(usize),
    #[error("key encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Ed25519 verification key
///
/// On the wire a verkey is always base58, which is also what `Display`
/// and `FromStr` produce and accept. For key-wrapping the verkey is mapped
/// onto its X25519 counterpart with [`VerKey::to_x25519`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerKey([u8; PUBLIC_KEY_SIZE]);

impl From<[u8; PUBLIC_KEY_SIZE]> for VerKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        VerKey(bytes)
    }
}

impl TryFrom<&[u8]> for VerKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid verkey size, expected {}, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut buff = [0; PUBLIC_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(buff.into())
    }
}

impl FromStr for VerKey {
    type Err = KeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl fmt::Display for VerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for VerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerKey({})", self.to_base58())
    }
}

impl VerKey {
    pub fn from_base58(b58: &str) -> Result<Self, KeyError> {
        let bytes = b58_decode(b58)?;
        Self::try_from(bytes.as_slice())
    }

    pub fn to_base58(&self) -> String {
        b58_encode(self.0)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    /// Convert the Ed25519 verkey to its X25519 (Montgomery) public key
    ///
    /// Fails for byte strings that are not a valid Edwards point, and for
    /// small-order points, which would yield a predictable shared secret.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) fn to_x25519(&self) -> Result<crypto_box::PublicKey, KeyError> {
        let edwards_point = CompressedEdwardsY(self.0)
            .decompress()
            .ok_or_else(|| anyhow::anyhow!("verkey failed to decompress edwards point"))?;
        if edwards_point.is_small_order() {
            return Err(anyhow::anyhow!("verkey is a small order point").into());
        }
        let montgomery_point = edwards_point.to_montgomery();
        Ok(crypto_box::PublicKey::from(montgomery_point.to_bytes()))
    }

    /// Verify a detached signature
    ///
    /// Any rejection, including malformed key or signature bytes, is
    /// reported as `false`.
    pub fn verify_detached(&self, msg: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = <[u8; SIGNATURE_SIZE]>::try_from(signature) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        verifying_key
            .verify_strict(msg, &Signature::from_bytes(&signature))
            .is_ok()
    }
}

/// Ed25519 signing secret in the 64-byte `seed || public` layout
///
/// This is the form handed back by key stores. The seed half is what we
/// persist; the public half is checked against the seed whenever a secret
/// is built from raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret([u8; SECRET_KEY_SIZE]);

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret({}, ..)", self.public())
    }
}

impl TryFrom<&[u8]> for SigningSecret {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let keypair_bytes = <[u8; SECRET_KEY_SIZE]>::try_from(bytes).map_err(|_| {
            anyhow::anyhow!(
                "invalid signing secret size, expected {}, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )
        })?;
        let signing_key = SigningKey::from_keypair_bytes(&keypair_bytes)
            .map_err(|_| anyhow::anyhow!("signing secret does not match its public half"))?;
        Ok(SigningSecret(signing_key.to_keypair_bytes()))
    }
}

impl SigningSecret {
    /// Derive a signing secret from a 32 byte seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        let seed = <[u8; SEED_SIZE]>::try_from(seed).map_err(|_| KeyError::InvalidSeed(seed.len()))?;
        Ok(SigningSecret(SigningKey::from_bytes(&seed).to_keypair_bytes()))
    }

    /// Parse a signing secret from a hex encoded seed
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; SEED_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| anyhow::anyhow!("seed hex decode error"))?;
        Self::from_seed(&buff)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.seed())
    }

    /// Encode the seed in PEM format with tag "PRIVATE KEY"
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new("PRIVATE KEY", self.seed());
        pem::encode(&pem)
    }

    /// Parse a signing secret from a PEM encoded seed
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;
        if pem.tag() != "PRIVATE KEY" {
            return Err(anyhow::anyhow!("invalid PEM tag, expected PRIVATE KEY").into());
        }
        Self::from_seed(pem.contents())
    }

    pub fn seed(&self) -> [u8; SEED_SIZE] {
        let mut seed = [0; SEED_SIZE];
        seed.copy_from_slice(&self.0[..SEED_SIZE]);
        seed
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.0
    }

    pub fn public(&self) -> VerKey {
        let mut public = [0; PUBLIC_KEY_SIZE];
        public.copy_from_slice(&self.0[SEED_SIZE..]);
        VerKey(public)
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.seed())
    }

    /// Convert the Ed25519 secret to its X25519 counterpart
    ///
    /// Uses the scalar Ed25519 signs with, so the matching public key is
    /// exactly `self.public().to_x25519()`. Clamping happens on use.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) fn to_x25519(&self) -> crypto_box::SecretKey {
        crypto_box::SecretKey::from(self.signing_key().to_scalar_bytes())
    }

    /// Produce a detached Ed25519 signature over `msg`
    pub fn sign(&self, msg: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing_key().sign(msg).to_bytes()
    }
}

/// An Ed25519 signing keypair, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: VerKey,
    pub secret: SigningSecret,
}

impl From<SigningSecret> for KeyPair {
    fn from(secret: SigningSecret) -> Self {
        KeyPair {
            public: secret.public(),
            secret,
        }
    }
}

impl KeyPair {
    /// Generate a keypair from a fresh random seed
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut OsRng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; SEED_SIZE];
        rng.fill_bytes(&mut seed);
        SigningSecret(SigningKey::from_bytes(&seed).to_keypair_bytes()).into()
    }

    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        Ok(SigningSecret::from_seed(seed)?.into())
    }
}

/// Create a signing keypair, deterministically when a seed is given
pub fn generate_signing_keypair(seed: Option<&[u8]>) -> Result<KeyPair, KeyError> {
    match seed {
        Some(seed) => KeyPair::from_seed(seed),
        None => Ok(KeyPair::generate()),
    }
}

/// Draw `n` bytes from the operating system's CSPRNG
pub fn random_bytes(n: usize) -> Vec<u8> {
    random_bytes_with_rng(&mut OsRng, n)
}

pub fn random_bytes_with_rng<R: RngCore + CryptoRng>(rng: &mut R, n: usize) -> Vec<u8> {
    let mut buff = vec![0u8; n];
    rng.fill_bytes(&mut buff);
    buff
}

/// Sign a message, returning the detached signature
pub fn sign(message: &[u8], secret: &SigningSecret) -> [u8; SIGNATURE_SIZE] {
    secret.sign(message)
}

/// Verify a combined `signature || message` blob against a verkey
///
/// Never fails; anything the primitive rejects, including blobs too short
/// to hold a signature, is `false`.
pub fn verify_signed_message(signed: &[u8], verkey: &VerKey) -> bool {
    if signed.len() < SIGNATURE_SIZE {
        return false;
    }
    let (signature, message) = signed.split_at(SIGNATURE_SIZE);
    verkey.verify_detached(message, signature)
}
