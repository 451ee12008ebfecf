//! Password login and login-passcode dispatch.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::super::ApiError;
use super::state::AuthState;
use super::storage::{
    insert_passcode_records, insert_session, lookup_account_by_contact, lookup_password_login,
    passcode_cooldown_active,
};
use super::types::{Channel, LoginRequest, LoginResponse, Role, SendPasscodeRequest};
use super::utils::{normalize_contact, normalize_email, verify_password};

/// Authenticate with email and password, returning a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.expose_secret().is_empty() {
        return ApiError::Validation("Missing email or password".to_string()).into_response();
    }

    // Unknown accounts and wrong passwords produce the same 401.
    let record = match lookup_password_login(&pool, &email).await {
        Ok(Some(record)) => record,
        Ok(None) => return ApiError::Unauthorized("Invalid credentials").into_response(),
        Err(err) => return ApiError::Backend(err).into_response(),
    };

    if !verify_password(&record.password_hash, request.password.expose_secret()) {
        return ApiError::Unauthorized("Invalid credentials").into_response();
    }

    if record.status != "active" {
        return ApiError::Forbidden("Account is not verified yet").into_response();
    }

    let Some(role) = Role::parse(&record.role) else {
        error!("unknown role in accounts row: {}", record.role);
        return ApiError::Backend(anyhow::anyhow!("unknown account role")).into_response();
    };

    match insert_session(
        &pool,
        record.account_id,
        auth_state.config().session_ttl_seconds(),
    )
    .await
    {
        Ok(token) => Json(LoginResponse {
            token,
            role,
            redirect_to: role.dashboard_path().to_string(),
        })
        .into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

/// Dispatch a login passcode to an already-verified account.
///
/// Always answers 204 so the endpoint cannot be used to enumerate which
/// contacts have accounts. Pending signups use /v1/auth/passcode/resend instead.
#[utoipa::path(
    post,
    path = "/v1/auth/passcode/send",
    request_body = SendPasscodeRequest,
    responses(
        (status = 204, description = "Dispatch accepted")
    ),
    tag = "auth"
)]
pub async fn send_login_passcode(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SendPasscodeRequest>>,
) -> impl IntoResponse {
    let request: SendPasscodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };

    let contact = normalize_contact(request.channel, &request.contact);

    match send(&pool, request.channel, &contact, &auth_state).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to send login passcode: {err}");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

async fn send(
    pool: &PgPool,
    channel: Channel,
    contact: &str,
    auth_state: &AuthState,
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    let Some(account) = lookup_account_by_contact(&mut tx, channel, contact).await? else {
        tx.commit().await?;
        return Ok(());
    };

    if account.status != "active" {
        tx.commit().await?;
        return Ok(());
    }

    if passcode_cooldown_active(
        &mut tx,
        account.id,
        channel,
        auth_state.config().resend_cooldown_seconds(),
    )
    .await?
    {
        tx.commit().await?;
        return Ok(());
    }

    let recipient = match channel {
        Channel::Email => account.email.clone(),
        Channel::Phone => account.phone.clone(),
    };
    let _ = insert_passcode_records(&mut tx, account.id, channel, &recipient, auth_state.config())
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::state::{AuthConfig, AuthState};
    use super::{login, send_login_passcode};
    use crate::api::handlers::auth::types::LoginRequest;
    use anyhow::Result;
    use axum::extract::Extension;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::Json;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(AuthConfig::new(
            "http://localhost:5173".to_string(),
        )))
    }

    #[tokio::test]
    async fn login_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = login(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn login_missing_password() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = login(
            Extension(pool),
            Extension(auth_state()),
            Some(Json(LoginRequest {
                email: "a@example.com".to_string(),
                password: String::new().into(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn send_login_passcode_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = send_login_passcode(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
