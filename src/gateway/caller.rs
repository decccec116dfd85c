// Keyward — Caller Identification
//
// Request extractors that establish who is calling before a handler runs.
// `Identity` validates the bearer token and yields the trusted username that the
// store uses for ownership checks. `BasicCredentials` pulls a username/password
// pair out of an HTTP Basic `Authorization` header for the login endpoint.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::GatewayError;
use super::login::parse_basic_auth;
use super::server::AppState;

/// The authenticated caller, taken from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn username(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = authorization(parts);
        let username = state.auth.authenticate(header).map_err(|e| {
            tracing::info!(path = %parts.uri.path(), error = %e, "Bearer token rejected");
            GatewayError::from(e)
        })?;
        Ok(Self(username))
    }
}

/// Username and password presented via HTTP Basic auth.
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BasicCredentials {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (username, password) = authorization(parts)
            .and_then(parse_basic_auth)
            .ok_or_else(|| {
                tracing::info!("Login without usable Basic credentials");
                GatewayError::Unauthenticated("missing Basic credentials".to_string())
            })?;
        Ok(Self { username, password })
    }
}

fn authorization(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
