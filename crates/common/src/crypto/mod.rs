//! Cryptographic primitives for packwire
//!
//! - **Identity & Signing**: Ed25519 keypairs (`KeyPair`, `VerKey`, `SigningSecret`)
//! - **Content Encryption**: ChaCha20-Poly1305 IETF under a per-message `ContentKey`
//! - **Key Wrapping**: X25519 keys derived from the Ed25519 pair, used with
//!   libsodium-compatible sealed boxes and `crypto_box`
//!
//! # Key Derivation
//!
//! A party only ever holds one Ed25519 keypair. Its X25519 encryption pair
//! is derived on demand and never stored:
//! 1. The verkey is decompressed to an Edwards point and mapped onto the
//!    Montgomery curve
//! 2. The secret scalar is the clamped low half of SHA-512 over the seed
//!
//! Both halves are reproducible bit-for-bit from the Ed25519 pair, so a
//! verkey published once is enough for anyone to encrypt to its owner.

mod cek;
mod keys;

pub use cek::{CekError, ContentKey, SealedPayload, CEK_SIZE, NONCE_SIZE, TAG_SIZE};
pub use keys::{
    generate_signing_keypair, random_bytes, random_bytes_with_rng, sign, verify_signed_message,
    KeyError, KeyPair, SigningSecret, VerKey, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SEED_SIZE,
    SIGNATURE_SIZE,
};
