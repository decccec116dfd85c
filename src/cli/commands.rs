// Keyward — CLI Command Handlers
//
// Each function handles one CLI subcommand. `serve` wires the config, the
// credential table, the token authority and the store into a running gateway;
// `hash` produces digests for the config's `[users]` table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::credentials::CredentialHasher;
use crate::error::KeywardError;
use crate::gateway::{Authenticator, Gateway};
use crate::store::KvStore;

use super::Commands;

/// Execute the parsed CLI command.
pub async fn execute(command: Commands) -> Result<(), KeywardError> {
    match command {
        Commands::Serve { config, port } => cmd_serve(config, port).await,
        Commands::Hash { password } => cmd_hash(&password),
    }
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(config_path: Option<PathBuf>, port: Option<u16>) -> Result<(), KeywardError> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let tokens = config.token_authority()?;
    let table = config.credential_table();
    if table.is_empty() {
        tracing::warn!("No users configured; every login will be refused");
    } else if !table.contains(&config.auth.admin_user) {
        tracing::warn!(
            admin = %config.auth.admin_user,
            "Admin user has no credentials; remote shutdown is unavailable"
        );
    }

    let auth = Authenticator::new(table, CredentialHasher::default(), tokens)?;
    let store = KvStore::spawn();
    let gateway = Gateway::new(
        store.clone(),
        Arc::new(auth),
        config.auth.admin_user.clone(),
        Duration::from_secs(config.server.shutdown_grace_secs),
    );

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    println!("Keyward listening on http://{}", listener.local_addr()?);

    let served = gateway.run(listener).await;
    store.close().await?;
    served?;

    println!("Keyward stopped.");
    Ok(())
}

// ─── Hash ────────────────────────────────────────────────────────────────────

fn cmd_hash(password: &str) -> Result<(), KeywardError> {
    let hasher = CredentialHasher::default();
    let digest = hasher.hash_password(password)?;
    let verified = hasher.verify_password(password, &digest)?;

    println!("{}", digest);
    println!("Verified: {}", verified);
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
