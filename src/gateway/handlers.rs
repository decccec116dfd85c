// Keyward — Route Handlers
//
// One handler per endpoint. Every store route takes an `Identity`, so a request
// without a valid bearer token is rejected before the handler body runs.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::store::EntryInfo;

use super::caller::{BasicCredentials, Identity};
use super::error::GatewayError;
use super::server::AppState;

pub async fn ping() -> &'static str {
    "pong"
}

/// Exchange HTTP Basic credentials for `Bearer <token>`.
pub async fn login(
    State(state): State<AppState>,
    creds: BasicCredentials,
) -> Result<String, GatewayError> {
    let auth = Arc::clone(&state.auth);
    // Argon2id is deliberately slow; keep it off the async workers.
    let token = tokio::task::spawn_blocking(move || auth.login(&creds.username, &creds.password))
        .await
        .map_err(|e| GatewayError::Internal(format!("login task failed: {}", e)))??;

    Ok(format!("Bearer {}", token))
}

pub async fn put_key(
    State(state): State<AppState>,
    identity: Identity,
    Path(key): Path<String>,
    value: String,
) -> Result<&'static str, GatewayError> {
    state.store.write(&key, &value, identity.username()).await?;
    tracing::info!(key = %key, owner = %identity, "Stored key");
    Ok("OK")
}

pub async fn get_key(
    State(state): State<AppState>,
    _identity: Identity,
    Path(key): Path<String>,
) -> Result<String, GatewayError> {
    state.store.read(&key).await?.ok_or(GatewayError::NotFound)
}

pub async fn delete_key(
    State(state): State<AppState>,
    identity: Identity,
    Path(key): Path<String>,
) -> Result<&'static str, GatewayError> {
    if !state.store.delete(&key, identity.username()).await? {
        return Err(GatewayError::NotFound);
    }
    tracing::info!(key = %key, owner = %identity, "Deleted key");
    Ok("OK")
}

pub async fn list_key(
    State(state): State<AppState>,
    _identity: Identity,
    Path(key): Path<String>,
) -> Result<Json<EntryInfo>, GatewayError> {
    let info = state.store.list(&key).await?.ok_or(GatewayError::NotFound)?;
    Ok(Json(info))
}

pub async fn list_all(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<EntryInfo>>, GatewayError> {
    Ok(Json(state.store.list_all().await?))
}

/// `/store` or `/list/` with no key segment. Still requires a valid token.
pub async fn missing_key(_identity: Identity) -> GatewayError {
    GatewayError::BadRequest("No key specified")
}

/// Ask the server to stop. Only the configured admin may do this.
pub async fn shutdown(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<&'static str, GatewayError> {
    if identity.username() != state.admin_user {
        tracing::warn!(caller = %identity, "Shutdown refused for non-admin");
        return Err(GatewayError::Forbidden(format!(
            "{} may not shut down the server",
            identity
        )));
    }

    tracing::info!(caller = %identity, "Shutdown requested");
    state.shutdown.trigger();
    Ok("OK")
}
