// Keyward — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: serve, hash.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Keyward — an ownership-aware key/value server with token authentication.
#[derive(Parser, Debug)]
#[command(name = "keyward")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server until an admin shutdown or Ctrl-C.
    Serve {
        /// Config file (default: <config dir>/keyward/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override `server.port` from the config file.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the encoded Argon2id digest of a password, for the `[users]` table.
    /// Prefer a throwaway shell; the password ends up in shell history.
    Hash {
        password: String,
    },
}
