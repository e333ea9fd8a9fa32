/**
 * Cryptographic types and operations.
 *  - Ed25519 keypairs, signing and verification
 *  - Ed25519 -> X25519 conversion for key wrapping
 *  - Per-message content encryption
 */
pub mod crypto;
/**
 * Base64url and base58 codecs shared by the
 *  wire format.
 */
pub mod encoding;
/**
 * The key lookup capability `unpack` resolves
 *  recipients against, plus an in-memory store.
 */
pub mod keystore;
/**
 * Light parsing of decrypted plaintext ahead of
 *  message dispatch.
 */
pub mod message;
/**
 * The pack/unpack envelope itself: recipient key
 *  wrapping, key resolution and the wire format.
 */
pub mod pack;

pub mod prelude {
    pub use crate::crypto::{KeyPair, SigningSecret, VerKey};
    pub use crate::keystore::{KeyStore, MemoryKeyStore};
    pub use crate::pack::{pack, unpack, PackError, Unpacked};
}
