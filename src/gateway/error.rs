// Keyward — Gateway error types
//
// Every failure a handler can produce, and its mapping onto an HTTP status.
// Bodies are short plain-text reasons; details go to the log, not the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Outcome of a failed login attempt.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown user or wrong password; deliberately not distinguished.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Key not found")]
    NotFound,

    #[error("Store unavailable")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OwnershipConflict { .. } => Self::Forbidden(err.to_string()),
            StoreError::EmptyKey => Self::BadRequest("No key specified"),
            StoreError::MissingIdentity => Self::BadRequest("No owner specified"),
            StoreError::EngineClosed => Self::Unavailable,
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) | TokenError::EmptySecret => Self::Internal(err.to_string()),
            _ => Self::Unauthenticated(err.to_string()),
        }
    }
}

impl From<LoginError> for GatewayError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => Self::Unauthenticated(err.to_string()),
            // A stored digest we cannot parse is a server-side fault.
            LoginError::Credential(e) => Self::Internal(e.to_string()),
            LoginError::Token(e) => e.into(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(reason) => tracing::error!(%reason, "Request failed"),
            Self::Unavailable => tracing::warn!("Request rejected: store is closed"),
            other => tracing::info!(status = status.as_u16(), reason = %other, "Request rejected"),
        }

        let body = match self {
            Self::NotFound => "404 key not found",
            _ => status.canonical_reason().unwrap_or("Error"),
        };
        (status, body).into_response()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_distinct_statuses() {
        let forbidden: GatewayError = StoreError::OwnershipConflict {
            key: "abc".to_string(),
        }
        .into();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let bad: GatewayError = StoreError::EmptyKey.into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let bad: GatewayError = StoreError::MissingIdentity.into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let closed: GatewayError = StoreError::EngineClosed.into();
        assert_eq!(closed.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        for err in [
            TokenError::BadSignature,
            TokenError::Expired,
            TokenError::Unauthenticated,
            TokenError::Malformed("x".to_string()),
        ] {
            let mapped: GatewayError = err.into();
            assert_eq!(mapped.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_login_errors() {
        let invalid: GatewayError = LoginError::InvalidCredentials.into();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

        let malformed: GatewayError =
            LoginError::Credential(CredentialError::MalformedDigest("x".to_string())).into();
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_body() {
        let response = GatewayError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
