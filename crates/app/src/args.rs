pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "packwire")]
#[command(about = "Pack and unpack agent-to-agent message envelopes")]
pub struct Args {
    /// Path to the packwire config directory (defaults to ~/.packwire)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    #[command(subcommand)]
    pub command: crate::Command,
}
