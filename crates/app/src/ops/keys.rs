use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Keys;

#[derive(Debug, thiserror::Error)]
pub enum KeysError {
    #[error(transparent)]
    State(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Keys {
    type Error = KeysError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.load_state()?;
        let default = state.config.default_sender.as_deref();

        let lines: Vec<String> = state
            .list_keys()?
            .into_iter()
            .map(|verkey| {
                let verkey = verkey.to_base58();
                if Some(verkey.as_str()) == default {
                    format!("{} (default)", verkey)
                } else {
                    verkey
                }
            })
            .collect();

        if lines.is_empty() {
            return Ok("no keys".to_string());
        }
        Ok(lines.join("\n"))
    }
}
