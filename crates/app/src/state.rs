use std::{fs, path::PathBuf};

use common::prelude::{KeyPair, SigningSecret, VerKey};
use serde::{Deserialize, Serialize};

use crate::keystore::DirKeyStore;

pub const APP_NAME: &str = "packwire";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_DIR_NAME: &str = "keys";
pub const KEY_FILE_EXTENSION: &str = "pem";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level when neither `--log-level` nor RUST_LOG is given
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Verkey to pack as when `pack` is given neither `--from` nor `--anon`
    #[serde(default)]
    pub default_sender: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_sender: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.packwire)
    pub app_dir: PathBuf,
    /// Path to the directory of PEM key files
    pub keys_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.packwire)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;
        if app_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&app_dir)?;
        let keys_path = app_dir.join(KEYS_DIR_NAME);
        fs::create_dir_all(&keys_path)?;

        let config = config.unwrap_or_default();
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        tracing::debug!(dir = %app_dir.display(), "initialized state directory");
        Ok(Self {
            app_dir,
            keys_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;
        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let keys_path = app_dir.join(KEYS_DIR_NAME);
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        if !keys_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", KEYS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        Ok(Self {
            app_dir,
            keys_path,
            config_path,
            config,
        })
    }

    /// Persist the current config back to config.toml
    pub fn save_config(&self) -> Result<(), StateError> {
        fs::write(&self.config_path, toml::to_string_pretty(&self.config)?)?;
        Ok(())
    }

    /// Key store over this state's key directory
    pub fn key_store(&self) -> DirKeyStore {
        DirKeyStore::new(self.keys_path.clone())
    }

    /// Write a keypair's seed to `keys/<verkey>.pem`
    pub fn save_key(&self, keypair: &KeyPair) -> Result<VerKey, StateError> {
        let path = self.key_path(&keypair.public);
        if path.exists() {
            return Err(StateError::KeyExists(keypair.public.to_base58()));
        }
        fs::write(&path, keypair.secret.to_pem())?;
        Ok(keypair.public)
    }

    /// Load the signing secret for a local verkey
    pub fn load_key(&self, verkey: &VerKey) -> Result<SigningSecret, StateError> {
        let path = self.key_path(verkey);
        if !path.exists() {
            return Err(StateError::UnknownKey(verkey.to_base58()));
        }
        let pem = fs::read_to_string(&path)?;
        let secret =
            SigningSecret::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        if secret.public() != *verkey {
            return Err(StateError::InvalidKey(format!(
                "{} does not hold the secret for its verkey",
                path.display()
            )));
        }
        Ok(secret)
    }

    /// Verkeys of every key file in the key directory, sorted
    pub fn list_keys(&self) -> Result<Vec<VerKey>, StateError> {
        let mut verkeys = Vec::new();
        for entry in fs::read_dir(&self.keys_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEY_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match VerKey::from_base58(stem) {
                Ok(verkey) => verkeys.push(verkey),
                Err(e) => tracing::warn!(path = %path.display(), "skipping key file: {}", e),
            }
        }
        verkeys.sort();
        Ok(verkeys)
    }

    pub fn key_path(&self, verkey: &VerKey) -> PathBuf {
        key_file_path(&self.keys_path, verkey)
    }
}

/// `<keys_dir>/<verkey>.pem`; only ever built from a parsed verkey
pub fn key_file_path(keys_dir: &std::path::Path, verkey: &VerKey) -> PathBuf {
    keys_dir.join(format!("{}.{}", verkey.to_base58(), KEY_FILE_EXTENSION))
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("packwire directory not initialized. Run 'packwire init' first")]
    NotInitialized,

    #[error("packwire directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("no local key for verkey {0}")]
    UnknownKey(String),

    #[error("key already exists: {0}")]
    KeyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
