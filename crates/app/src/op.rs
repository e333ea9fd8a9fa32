use std::error::Error;
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use crate::state::{AppState, StateError};

#[derive(Clone, Debug)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.packwire)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn load_state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }
}

/// Read an op's input from a file, or from stdin when no file is given
pub async fn read_input(path: Option<&Path>) -> std::io::Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path).await,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_read_input_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("input");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(read_input(Some(path.as_path())).await.unwrap(), b"hello");
        assert!(read_input(Some(tmp.path().join("missing").as_path())).await.is_err());
    }
}
