// Keyward — Token Authority
//
// Issues and validates compact HS256-signed identity tokens. A token carries the
// username, an expiry (`exp`, Unix seconds) and the issuer tag (`iss`). Nothing is
// kept server-side: every presented token is re-validated on its own, and
// validity is purely time-bounded.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::TokenError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Default issuer tag written into, and required on, every token.
pub const DEFAULT_ISSUER: &str = "MyRESTService";

/// Default lifetime of an issued token.
pub const DEFAULT_VALIDITY_SECS: i64 = 5 * 60;

const BEARER_PREFIX: &str = "Bearer ";

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
    pub iss: String,
}

// ─── Authority ───────────────────────────────────────────────────────────────

/// Holds the signing secret, issuer and validity window.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    validity: Duration,
}

impl TokenAuthority {
    /// Build an authority from explicit configuration. The secret must not be empty.
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        validity: Duration,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer,
            validity,
        })
    }

    /// Authority with the default issuer and the five-minute validity window.
    pub fn with_defaults(secret: &[u8]) -> Result<Self, TokenError> {
        Self::new(
            secret,
            DEFAULT_ISSUER,
            Duration::seconds(DEFAULT_VALIDITY_SECS),
        )
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for `username`, valid from now for the configured window.
    pub fn issue_token(&self, username: &str) -> Result<String, TokenError> {
        self.issue_token_at(username, Utc::now())
    }

    /// Issue a token as if it had been issued at `issued_at`.
    pub fn issue_token_at(
        &self,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.validity)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        let claims = Claims {
            username: username.to_string(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        tracing::debug!(username = %username, exp = claims.exp, "Token issued");
        Ok(token)
    }

    /// Validate `token` and return the username it asserts.
    ///
    /// The signature is checked before any claim, so a forged token is always
    /// reported as `BadSignature` even if it is also expired.
    pub fn validate_token(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        Ok(data.claims.username)
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("validity_secs", &self.validity.num_seconds())
            .finish()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn strip_bearer(header: &str) -> Result<&str, TokenError> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(TokenError::Unauthenticated)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
