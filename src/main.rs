// Keyward — Application Entry Point
//
// Sets up log output, reads the command line and hands off to `cli::execute`.
// Any error ends the process with exit status 1.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use keyward::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // Falls back to `keyward=info` when RUST_LOG is unset. Secrets are never
    // logged at any level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyward=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
