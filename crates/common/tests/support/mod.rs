//! Shared helpers for envelope integration tests
#![allow(dead_code)]

use common::crypto::KeyPair;
use common::encoding::{b64_decode, b64_encode};
use common::keystore::MemoryKeyStore;
use common::pack::Envelope;

/// A key store holding exactly the given keypairs
pub fn store_with(keypairs: &[&KeyPair]) -> MemoryKeyStore {
    let store = MemoryKeyStore::new();
    for keypair in keypairs {
        store.insert(keypair).unwrap();
    }
    store
}

/// Generate `n` random keypairs
pub fn keypairs(n: usize) -> Vec<KeyPair> {
    (0..n).map(|_| KeyPair::generate()).collect()
}

pub fn parse(packed: &[u8]) -> Envelope {
    Envelope::from_bytes(packed).unwrap()
}

/// Flip one bit of a base64url field's decoded bytes
pub fn flip_bit(field: &str, byte: usize, bit: u8) -> String {
    let mut bytes = b64_decode(field).unwrap();
    bytes[byte] ^= 1 << bit;
    b64_encode(bytes)
}
