// Keyward — Configuration
//
// TOML configuration for the server, the token authority and the credential
// table. Everything has a default except the signing key, which must come from
// the file or from the KEYWARD_SIGNING_KEY environment variable (env wins).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::credentials::CredentialTable;
use crate::token::{TokenAuthority, DEFAULT_ISSUER, DEFAULT_VALIDITY_SECS};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Environment variable that overrides `auth.signing_key`.
pub const SIGNING_KEY_ENV: &str = "KEYWARD_SIGNING_KEY";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;
const DEFAULT_ADMIN_USER: &str = "admin";

/// Upper bound on `auth.token_validity_secs` (7 days).
const MAX_TOKEN_VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

/// Keys shorter than this are accepted but logged as weak.
const RECOMMENDED_KEY_LEN: usize = 32;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No signing key configured; set auth.signing_key or KEYWARD_SIGNING_KEY")]
    MissingSigningKey,

    #[error("Could not determine the platform config directory")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    /// username → encoded Argon2id digest
    pub users: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long in-flight requests may drain after a shutdown request.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub signing_key: Option<String>,
    pub issuer: String,
    pub token_validity_secs: i64,
    /// The only identity allowed to shut the server down.
    pub admin_user: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            issuer: DEFAULT_ISSUER.to_string(),
            token_validity_secs: DEFAULT_VALIDITY_SECS,
            admin_user: DEFAULT_ADMIN_USER.to_string(),
        }
    }
}

/// Custom Debug that never reveals the signing key.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "signing_key",
                &self.signing_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("issuer", &self.issuer)
            .field("token_validity_secs", &self.token_validity_secs)
            .field("admin_user", &self.admin_user)
            .finish()
    }
}

impl Config {
    /// `<platform config dir>/keyward/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs_next::config_dir()
            .map(|dir| dir.join("keyward").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Read and parse a config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&raw)?;
        config.apply_overrides(|name| std::env::var(name).ok());

        tracing::info!(
            path = %path.display(),
            users = config.users.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(SIGNING_KEY_ENV).filter(|k| !k.is_empty()) {
            self.auth.signing_key = Some(key);
        }
    }

    /// The configured signing key; required.
    pub fn signing_key(&self) -> Result<&str, ConfigError> {
        self.auth
            .signing_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingSigningKey)
    }

    /// Build the token authority described by the `[auth]` section.
    pub fn token_authority(&self) -> Result<TokenAuthority, ConfigError> {
        let key = self.signing_key()?;
        if key.len() < RECOMMENDED_KEY_LEN {
            tracing::warn!(
                len = key.len(),
                recommended = RECOMMENDED_KEY_LEN,
                "Signing key is shorter than recommended"
            );
        }

        let validity = self.auth.token_validity_secs;
        if !(1..=MAX_TOKEN_VALIDITY_SECS).contains(&validity) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_validity_secs must be between 1 and {}, got {}",
                MAX_TOKEN_VALIDITY_SECS, validity
            )));
        }

        TokenAuthority::new(
            key.as_bytes(),
            self.auth.issuer.clone(),
            chrono::Duration::seconds(validity),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The credential table described by the `[users]` section.
    pub fn credential_table(&self) -> CredentialTable {
        CredentialTable::new(self.users.clone())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
