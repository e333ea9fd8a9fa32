use clap::Args;
use common::prelude::{KeyPair, SigningSecret};

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Keygen {
    /// Hex encoded 32 byte seed; random if omitted
    #[arg(long)]
    pub seed: Option<String>,

    /// Make the new key the default sender for `pack`
    #[arg(long)]
    pub default: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid seed: {0}")]
    InvalidSeed(#[from] common::crypto::KeyError),
}

#[async_trait::async_trait]
impl crate::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut state = ctx.load_state()?;

        let keypair = match &self.seed {
            Some(seed) => KeyPair::from(SigningSecret::from_hex(seed)?),
            None => KeyPair::generate(),
        };
        let verkey = state.save_key(&keypair)?;
        tracing::info!(%verkey, "generated keypair");

        if self.default {
            state.config.default_sender = Some(verkey.to_base58());
            state.save_config()?;
        }

        Ok(verkey.to_base58())
    }
}
