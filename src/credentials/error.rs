// Keyward — Credential error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Encoded digest is not in the correct format: {0}")]
    MalformedDigest(String),

    #[error("Incompatible Argon2 version {found} (supported: {supported})")]
    IncompatibleVersion { found: u32, supported: u32 },

    #[error("Key derivation error: {0}")]
    Derivation(String),
}
