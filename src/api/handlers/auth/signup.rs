//! Signup endpoint: creates a pending account and dispatches the email passcode.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

use super::super::ApiError;
use super::state::AuthState;
use super::storage::{insert_account_and_challenge, NewAccount, SignupOutcome};
use super::types::{SignupRequest, SignupResponse};
use super::utils::{hash_password, normalize_email, normalize_phone, valid_email, valid_phone};

const MIN_PASSWORD_LEN: usize = 8;

/// Start the dual-channel signup flow.
///
/// The phone passcode is deliberately NOT sent here; it is dispatched once the
/// email passcode verifies, so the email channel anchors the account first.
#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, email passcode sent", body = SignupResponse),
        (status = 400, description = "Invalid email, phone, or password"),
        (status = 409, description = "Email or phone already registered")
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let request: SignupRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return ApiError::Validation("Missing payload".to_string()).into_response();
        }
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return ApiError::Validation("Invalid email address".to_string()).into_response();
    }

    let phone = normalize_phone(&request.phone);
    if !valid_phone(&phone) {
        return ApiError::Validation("Invalid phone number".to_string()).into_response();
    }

    if request.password.expose_secret().len() < MIN_PASSWORD_LEN {
        return ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into_response();
    }

    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return ApiError::Validation("Full name is required".to_string()).into_response();
    }

    // The hash is computed up front so the account row never exists without one.
    let password_hash = match hash_password(request.password.expose_secret()) {
        Ok(hash) => hash,
        Err(err) => return ApiError::Backend(err).into_response(),
    };

    let account = NewAccount {
        email: &email,
        phone: &phone,
        password_hash: &password_hash,
        role: request.role,
        full_name,
        organization_name: request.organization_name.as_deref().map(str::trim),
        address: request.address.as_deref().map(str::trim),
    };

    match insert_account_and_challenge(&pool, &account, auth_state.config()).await {
        Ok(SignupOutcome::Created) => (
            StatusCode::CREATED,
            Json(SignupResponse {
                message: "Passcode sent to email. Verify email to trigger the phone passcode."
                    .to_string(),
            }),
        )
            .into_response(),
        Ok(SignupOutcome::Conflict) => {
            ApiError::Conflict("An account with this email or phone already exists")
                .into_response()
        }
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::{AuthConfig, AuthState};
    use super::signup;
    use crate::api::handlers::auth::types::{Role, SignupRequest};
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

    fn request(email: &str, phone: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            phone: phone.to_string(),
            password: password.to_string().into(),
            role: Role::Buyer,
            full_name: "Test Buyer".to_string(),
            organization_name: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn signup_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = signup(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_invalid_email() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = signup(
            Extension(pool),
            Extension(auth_state()),
            Some(Json(request("not-an-email", "+15551234567", "longenough"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_invalid_phone() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = signup(
            Extension(pool),
            Extension(auth_state()),
            Some(Json(request("a@example.com", "12", "longenough"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_short_password() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = signup(
            Extension(pool),
            Extension(auth_state()),
            Some(Json(request("a@example.com", "+15551234567", "short"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
