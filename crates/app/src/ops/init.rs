use clap::Args;
use common::prelude::KeyPair;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Default log level written to the config file
    #[arg(long, default_value = "warn")]
    pub default_log_level: String,

    /// Also generate a keypair and make it the default sender
    #[arg(long)]
    pub with_key: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.default_log_level.parse::<tracing::Level>().is_err() {
            return Err(InitError::InvalidLogLevel(self.default_log_level.clone()));
        }
        let config = AppConfig {
            log_level: self.default_log_level.clone(),
            default_sender: None,
        };

        let mut state = AppState::init(ctx.config_path.clone(), Some(config))?;

        if self.with_key {
            let verkey = state.save_key(&KeyPair::generate())?;
            state.config.default_sender = Some(verkey.to_base58());
            state.save_config()?;
        }

        let output = format!(
            "Initialized packwire directory at: {}\n\
             - Keys: {}\n\
             - Config: {}\n\
             - Log level: {}\n\
             - Default sender: {}",
            state.app_dir.display(),
            state.keys_path.display(),
            state.config_path.display(),
            state.config.log_level,
            state.config.default_sender.as_deref().unwrap_or("none"),
        );

        Ok(output)
    }
}
