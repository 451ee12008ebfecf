//! Session introspection and logout.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;

use super::super::ApiError;
use super::principal::require_auth;
use super::storage::delete_session;
use super::types::SessionResponse;
use super::utils::{extract_bearer_token, hash_session_token};

/// Describe the account behind the bearer token.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Active session", body = SessionResponse),
        (status = 401, description = "Missing or expired token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn session(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    match require_auth(&headers, &pool).await {
        Ok(principal) => Json(SessionResponse {
            account_id: principal.account_id,
            email: principal.email,
            role: principal.role,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Revoke the bearer token. Idempotent, so an already-revoked or unknown
/// token still answers 204.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing authorization header")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return ApiError::Unauthorized("No authorization header").into_response();
    };

    let token_hash = hash_session_token(&token);
    match delete_session(&pool, &token_hash).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::{logout, session};
    use anyhow::Result;
    use axum::extract::Extension;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn session_requires_bearer() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = session(Extension(pool), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn logout_requires_bearer() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = logout(Extension(pool), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
