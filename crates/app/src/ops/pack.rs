use std::path::PathBuf;

use clap::Args;
use common::crypto::{KeyError, VerKey};
use common::pack::{pack, PackError};

use crate::op::read_input;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Pack {
    /// Recipient verkey (base58); repeat for multiple recipients
    #[arg(long = "to", required = true, num_args = 1..)]
    pub to: Vec<String>,

    /// Local verkey to authenticate as (defaults to the configured sender)
    #[arg(long, conflicts_with = "anon")]
    pub from: Option<String>,

    /// Pack without a sender identity
    #[arg(long)]
    pub anon: bool,

    /// Read the plaintext from a file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum PackOpError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid verkey {0}: {1}")]
    InvalidVerkey(String, KeyError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("message is not valid UTF-8")]
    NotUtf8,
    #[error("pack failed: {0}")]
    Pack(#[from] PackError),
}

fn parse_verkey(verkey: &str) -> Result<VerKey, PackOpError> {
    VerKey::from_base58(verkey).map_err(|e| PackOpError::InvalidVerkey(verkey.to_string(), e))
}

#[async_trait::async_trait]
impl crate::op::Op for Pack {
    type Error = PackOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let to = self
            .to
            .iter()
            .map(|verkey| parse_verkey(verkey))
            .collect::<Result<Vec<_>, _>>()?;

        // A sender is only needed for Authcrypt, so state is optional for --anon
        let sender = if self.anon {
            None
        } else {
            let state = ctx.load_state()?;
            match self.from.as_ref().or(state.config.default_sender.as_ref()) {
                Some(from) => Some(state.load_key(&parse_verkey(from)?)?),
                None => None,
            }
        };

        let message = String::from_utf8(read_input(self.input.as_deref()).await?)
            .map_err(|_| PackOpError::NotUtf8)?;

        let packed = pack(&message, &to, sender.as_ref())?;
        String::from_utf8(packed).map_err(|_| PackOpError::NotUtf8)
    }
}
