//! Multi-recipient message envelopes
//!
//! `pack` turns a plaintext into a four field JSON envelope that any of its
//! recipients can open on their own; `unpack` reverses it for whichever
//! local key the envelope was addressed to.
//!
//! # Pack
//!
//! 1. Generate a fresh content key (CEK)
//! 2. Wrap the CEK for every recipient ([`wrap_for_recipients`]), sealed
//!    (Anoncrypt) or boxed from the sender (Authcrypt)
//! 3. Encode the resulting [`ProtectedHeader`] as JSON, then base64url
//! 4. Encrypt the plaintext under the CEK with the encoded header as
//!    associated data
//!
//! # Unpack
//!
//! 1. Parse the envelope and its protected header
//! 2. Locate the first recipient block the [`KeyStore`](crate::keystore::KeyStore)
//!    holds a key for and unwrap the CEK ([`resolve`])
//! 3. Decrypt the payload, authenticating the raw `protected` string
//!
//! # Example
//!
//! ```
//! use common::crypto::KeyPair;
//! use common::keystore::MemoryKeyStore;
//! use common::pack::{pack, unpack};
//!
//! let alice = KeyPair::generate();
//! let bob = KeyPair::generate();
//! let keys = MemoryKeyStore::new();
//! keys.insert(&bob).unwrap();
//!
//! let packed = pack("ping", &[bob.public], Some(&alice.secret)).unwrap();
//! # futures::executor::block_on(async {
//! let unpacked = unpack(&packed, &keys).await.unwrap();
//! assert_eq!(unpacked.message, "ping");
//! assert_eq!(unpacked.sender_verkey, Some(alice.public.to_base58()));
//! # });
//! ```

mod envelope;
mod error;
mod header;
mod resolve;
mod wrap;

pub use envelope::{pack, pack_with_rng, unpack, Envelope, Unpacked};
pub use error::PackError;
pub use header::{
    PackAlg, ProtectedHeader, RecipientBlock, RecipientHeader, ENC_XCHACHA20POLY1305_IETF,
    TYP_JWM,
};
pub use resolve::{resolve, ResolvedKey};
pub use wrap::{wrap_for_recipients, BOX_NONCE_SIZE};
