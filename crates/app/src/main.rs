// CLI modules
mod args;
mod keystore;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Init, Keygen, Keys, Pack, Sign, Unpack, Verify, Version};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

command_enum! {
    (Init, Init),
    (Keygen, Keygen),
    (Keys, Keys),
    (Pack, Pack),
    (Unpack, Unpack),
    (Sign, Sign),
    (Verify, Verify),
    (Version, Version),
}

/// Pick the log level: flag, then config file, then warn
fn resolve_log_level(args: &Args) -> tracing::Level {
    if let Some(level) = args.log_level {
        return level;
    }
    state::AppState::load(args.config_path.clone())
        .ok()
        .and_then(|state| state.config.log_level.parse().ok())
        .unwrap_or(tracing::Level::WARN)
}

/// Logs go to stderr; stdout carries command output.
/// The returned guard must be kept alive for the duration of the program.
fn init_logging(level: tracing::Level) -> tracing_appender::non_blocking::WorkerGuard {
    let (stderr_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
    guard
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = init_logging(resolve_log_level(&args));

    let ctx = op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    };
    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}
