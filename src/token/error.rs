// Keyward — Token error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("No bearer token presented")]
    Unauthenticated,

    #[error("Signing key must not be empty")]
    EmptySecret,

    #[error("Token signing failed: {0}")]
    Signing(String),
}
