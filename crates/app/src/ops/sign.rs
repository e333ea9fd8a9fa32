use std::path::PathBuf;

use clap::Args;
use common::crypto::VerKey;
use common::encoding::b64_encode;

use crate::op::read_input;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Sign {
    /// Local verkey to sign with
    #[arg(long)]
    pub key: String,

    /// Read the message from a file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid verkey: {0}")]
    InvalidVerkey(#[from] common::crypto::KeyError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Sign {
    type Error = SignError;
    type Output = String;

    /// Print the detached signature as base64url
    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;
        let secret = state.load_key(&VerKey::from_base58(&self.key)?)?;
        let message = read_input(self.input.as_deref()).await?;
        Ok(b64_encode(secret.sign(&message)))
    }
}
