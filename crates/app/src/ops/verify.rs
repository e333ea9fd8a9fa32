use std::path::PathBuf;

use clap::Args;
use common::crypto::{KeyError, VerKey};
use common::encoding::{b64_decode, EncodingError};

use crate::op::read_input;

#[derive(Args, Debug, Clone)]
pub struct Verify {
    /// Verkey the signature should belong to
    #[arg(long)]
    pub verkey: String,

    /// base64url detached signature
    #[arg(long)]
    pub signature: String,

    /// Read the message from a file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid verkey: {0}")]
    InvalidVerkey(#[from] KeyError),
    #[error("invalid signature encoding: {0}")]
    Encoding(#[from] EncodingError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("signature does not verify")]
    BadSignature,
}

#[async_trait::async_trait]
impl crate::op::Op for Verify {
    type Error = VerifyError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let verkey = VerKey::from_base58(&self.verkey)?;
        let signature = b64_decode(&self.signature)?;
        let message = read_input(self.input.as_deref()).await?;

        if !verkey.verify_detached(&message, &signature) {
            return Err(VerifyError::BadSignature);
        }
        Ok("signature ok".to_string())
    }
}
