// Keyward — Top-level error types
//
// Aggregates errors from the store, credential, token and config modules into a
// single error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all Keyward operations.
#[derive(Debug, Error)]
pub enum KeywardError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Credential error: {0}")]
    Credential(#[from] crate::credentials::CredentialError),

    #[error("Token error: {0}")]
    Token(#[from] crate::token::TokenError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KeywardError>;
