//! Authenticated principal extraction for bearer-token endpoints.
//!
//! Every protected handler resolves the `Authorization: Bearer` header to a
//! principal up front; there is no ambient "current user" anywhere else.

use axum::http::HeaderMap;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::super::ApiError;
use super::storage::lookup_session;
use super::types::Role;
use super::utils::{extract_bearer_token, hash_session_token};

/// Authenticated account context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Resolve the bearer token into a principal.
pub async fn require_auth(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, ApiError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(ApiError::Unauthorized("No authorization header"));
    };
    let token_hash = hash_session_token(&token);
    let record = lookup_session(pool, &token_hash)
        .await
        .map_err(ApiError::Backend)?
        .ok_or(ApiError::Unauthorized("Unauthorized"))?;

    let Some(role) = Role::parse(&record.role) else {
        // A role outside the known set means the row was tampered with or the
        // schema drifted; treat it as a backend fault, not a client error.
        error!("unknown role in accounts row: {}", record.role);
        return Err(ApiError::Backend(anyhow::anyhow!("unknown account role")));
    };

    Ok(Principal {
        account_id: record.account_id,
        email: record.email,
        role,
    })
}
