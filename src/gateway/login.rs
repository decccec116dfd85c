// Keyward — Login and Bearer Authentication
//
// Ties the credential table, the hasher and the token authority together:
//   1. `login()` verifies a username/password and issues a bearer token
//   2. `authenticate()` validates a presented `Authorization` header and
//      returns the trusted username for the store's ownership checks
//
// Unknown usernames are verified against a decoy digest so that a failed login
// costs the same whether or not the user exists.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::credentials::{CredentialError, CredentialHasher, CredentialTable};
use crate::token::{strip_bearer, TokenAuthority, TokenError};

use super::error::LoginError;

/// Password fed to the decoy digest; never accepted for any user.
const DECOY_PASSWORD: &str = "keyward-decoy-credential";

#[derive(Debug)]
pub struct Authenticator {
    table: CredentialTable,
    hasher: CredentialHasher,
    tokens: TokenAuthority,
    decoy_digest: String,
}

impl Authenticator {
    /// Build an authenticator. Computes the decoy digest once, up front.
    pub fn new(
        table: CredentialTable,
        hasher: CredentialHasher,
        tokens: TokenAuthority,
    ) -> Result<Self, CredentialError> {
        let decoy_digest = hasher.hash_password(DECOY_PASSWORD)?;
        Ok(Self {
            table,
            hasher,
            tokens,
            decoy_digest,
        })
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// Verify `username`/`password` and issue a token on success.
    ///
    /// CPU-heavy: runs a full Argon2id derivation.
    pub fn login(&self, username: &str, password: &str) -> Result<String, LoginError> {
        let (digest, known) = match self.table.digest_for(username) {
            Some(digest) => (digest, true),
            None => (self.decoy_digest.as_str(), false),
        };

        let verified = self.hasher.verify_password(password, digest)?;
        if !known {
            tracing::warn!(username = %username, "Login for unknown user");
            return Err(LoginError::InvalidCredentials);
        }
        if !verified {
            tracing::warn!(username = %username, "Login with incorrect password");
            return Err(LoginError::InvalidCredentials);
        }

        let token = self.tokens.issue_token(username)?;
        tracing::info!(username = %username, "Returning token for user");
        Ok(token)
    }

    /// Resolve the acting identity from an `Authorization` header value.
    pub fn authenticate(&self, header: Option<&str>) -> Result<String, TokenError> {
        let header = header.ok_or(TokenError::Unauthenticated)?;
        let token = strip_bearer(header)?;
        self.tokens.validate_token(token)
    }
}

/// Parse an `Authorization: Basic <base64(user:password)>` header value.
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
