use std::fmt;
use std::path::PathBuf;

use clap::Args;
use common::message::Message;
use common::pack::{unpack, PackError};

use crate::op::read_input;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Unpack {
    /// Read the envelope from a file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum UnpackOpError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("unpack failed: {0}")]
    Unpack(#[from] PackError),
}

#[derive(Debug)]
pub struct UnpackOutput {
    pub recipient: String,
    pub sender: Option<String>,
    pub msg_type: Option<String>,
    pub message: String,
}

impl fmt::Display for UnpackOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "recipient: {}", self.recipient)?;
        writeln!(
            f,
            "sender: {}",
            self.sender.as_deref().unwrap_or("anonymous")
        )?;
        if let Some(msg_type) = &self.msg_type {
            writeln!(f, "type: {}", msg_type)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.message)
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Unpack {
    type Error = UnpackOpError;
    type Output = UnpackOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;
        let envelope = read_input(self.input.as_deref()).await?;

        let unpacked = unpack(&envelope, &state.key_store()).await?;

        // plain text messages are fine, they just have no type to report
        let msg_type = match Message::parse(&unpacked.message) {
            Ok(message) => Some(message.msg_type().to_string()),
            Err(e) => {
                tracing::debug!("message has no type: {}", e);
                None
            }
        };

        Ok(UnpackOutput {
            recipient: unpacked.recipient_verkey,
            sender: unpacked.sender_verkey,
            msg_type,
            message: unpacked.message,
        })
    }
}
