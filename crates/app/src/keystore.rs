use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use common::crypto::{KeyError, SigningSecret, VerKey};
use common::keystore::KeyStore;

use crate::state::key_file_path;

/// Key store backed by the `keys/` directory of PEM files
///
/// Lookups arrive with `kid`s straight off the wire, so a verkey is only
///  turned into a path after it parses as base58 of exactly 32 bytes and
///  re-encodes to the same string.
#[derive(Debug, Clone)]
pub struct DirKeyStore {
    keys_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum DirKeyStoreError {
    #[error("failed to read key file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key file for {verkey}: {source}")]
    InvalidKey {
        verkey: String,
        #[source]
        source: KeyError,
    },
    #[error("key file for {0} holds a different key")]
    Mismatch(String),
}

impl DirKeyStore {
    pub fn new(keys_dir: PathBuf) -> Self {
        Self { keys_dir }
    }
}

#[async_trait]
impl KeyStore for DirKeyStore {
    type Error = DirKeyStoreError;

    async fn find_key(&self, verkey: &str) -> Result<Option<SigningSecret>, Self::Error> {
        let parsed = match VerKey::from_base58(verkey) {
            Ok(parsed) if parsed.to_base58() == verkey => parsed,
            _ => return Ok(None),
        };

        let path = key_file_path(&self.keys_dir, &parsed);
        let pem = match tokio::fs::read_to_string(&path).await {
            Ok(pem) => pem,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let secret = SigningSecret::from_pem(&pem).map_err(|source| DirKeyStoreError::InvalidKey {
            verkey: verkey.to_string(),
            source,
        })?;
        if secret.public() != parsed {
            return Err(DirKeyStoreError::Mismatch(verkey.to_string()));
        }
        Ok(Some(secret))
    }
}
