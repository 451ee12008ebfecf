//! Passcode verification and resend endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::super::ApiError;
use super::progress::SignupProgress;
use super::state::AuthState;
use super::storage::{
    activate_account, consume_passcode, insert_passcode_records, insert_session,
    lookup_account_by_contact, mark_channel_verified, passcode_cooldown_active, passcode_sent,
    AccountRow,
};
use super::types::{
    Channel, ResendPasscodeRequest, Role, VerifyPasscodeRequest, VerifyPasscodeResponse,
};
use super::utils::normalize_contact;

/// Verify a passcode for either channel.
///
/// For a pending account this advances the dual-channel signup handshake:
/// email verification dispatches the phone passcode and opens a session;
/// the account activates when both channels are verified, whichever order
/// they complete in. For an active account this is a passcode login.
#[utoipa::path(
    post,
    path = "/v1/auth/passcode/verify",
    request_body = VerifyPasscodeRequest,
    responses(
        (status = 200, description = "Passcode accepted", body = VerifyPasscodeResponse),
        (status = 400, description = "Invalid or expired passcode")
    ),
    tag = "auth"
)]
pub async fn verify_passcode(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyPasscodeRequest>>,
) -> impl IntoResponse {
    let request: VerifyPasscodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };

    let code = request.code.trim();
    if code.is_empty() {
        return ApiError::Validation("Missing passcode".to_string()).into_response();
    }
    let contact = normalize_contact(request.channel, &request.contact);

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            return ApiError::Backend(anyhow::Error::from(err).context("begin verify transaction"))
                .into_response()
        }
    };

    // One failure message for unknown contacts and wrong codes alike, so the
    // endpoint cannot be used to enumerate which emails/phones have accounts.
    let invalid = || ApiError::Validation("Invalid or expired passcode".to_string());

    let account = match lookup_account_by_contact(&mut tx, request.channel, &contact).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            let _ = tx.rollback().await;
            return invalid().into_response();
        }
        Err(err) => {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    };

    match consume_passcode(&mut tx, account.id, request.channel, code).await {
        Ok(true) => {}
        Ok(false) => {
            // Wrong or expired code: the channel stays at "sent" and the
            // other channel is untouched.
            let _ = tx.rollback().await;
            return invalid().into_response();
        }
        Err(err) => {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    }

    let Some(role) = Role::parse(&account.role) else {
        let _ = tx.rollback().await;
        error!("unknown role in accounts row: {}", account.role);
        return ApiError::Backend(anyhow::anyhow!("unknown account role")).into_response();
    };

    if account.status == "active" {
        // Passcode login for an already-verified account.
        if let Err(err) = tx.commit().await {
            return ApiError::Backend(anyhow::Error::from(err).context("commit passcode login"))
                .into_response();
        }
        return match insert_session(
            &pool,
            account.id,
            auth_state.config().session_ttl_seconds(),
        )
        .await
        {
            Ok(token) => Json(VerifyPasscodeResponse {
                email_verified: true,
                phone_verified: true,
                complete: true,
                redirect_to: Some(role.dashboard_path().to_string()),
                token: Some(token),
            })
            .into_response(),
            Err(err) => ApiError::Backend(err).into_response(),
        };
    }

    match advance_signup(&mut tx, &account, request.channel, &auth_state).await {
        Ok(progress) => {
            if let Err(err) = tx.commit().await {
                return ApiError::Backend(anyhow::Error::from(err).context("commit verification"))
                    .into_response();
            }

            // Email verification authenticates the caller; hand out a bearer
            // token now so the client is signed in once the account activates.
            let token = if request.channel == Channel::Email || progress.is_complete() {
                match insert_session(
                    &pool,
                    account.id,
                    auth_state.config().session_ttl_seconds(),
                )
                .await
                {
                    Ok(token) => Some(token),
                    Err(err) => {
                        error!("Failed to open session after verification: {err}");
                        None
                    }
                }
            } else {
                None
            };

            let complete = progress.is_complete();
            Json(VerifyPasscodeResponse {
                email_verified: progress.email.is_verified(),
                phone_verified: progress.phone.is_verified(),
                complete,
                redirect_to: complete.then(|| role.dashboard_path().to_string()),
                token,
            })
            .into_response()
        }
        Err(err) => {
            let _ = tx.rollback().await;
            ApiError::Backend(err).into_response()
        }
    }
}

/// Apply one verified channel to a pending account and evaluate completion.
async fn advance_signup(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account: &AccountRow,
    channel: Channel,
    auth_state: &AuthState,
) -> anyhow::Result<SignupProgress> {
    let (email_verified, phone_verified) = mark_channel_verified(tx, account.id, channel).await?;
    let phone_sent = passcode_sent(tx, account.id, Channel::Phone).await?;
    let mut progress = SignupProgress::from_flags(email_verified, phone_verified, phone_sent);

    // Sequential dispatch policy: the phone passcode goes out only once the
    // email channel is verified. Completion below stays order-independent.
    if channel == Channel::Email && !progress.phone.is_verified() && !phone_sent {
        insert_passcode_records(
            tx,
            account.id,
            Channel::Phone,
            &account.phone,
            auth_state.config(),
        )
        .await?;
        progress.record_sent(Channel::Phone);
    }

    // Completion guard evaluated after every transition.
    if progress.is_complete() {
        activate_account(tx, account.id).await?;
    }

    Ok(progress)
}

/// Resend a passcode for a pending signup (always 204 to avoid account
/// enumeration).
///
/// Within the cooldown window this is a no-op; a phone resend before the email
/// channel verifies is also a no-op, matching the sequential dispatch policy.
#[utoipa::path(
    post,
    path = "/v1/auth/passcode/resend",
    request_body = ResendPasscodeRequest,
    responses(
        (status = 204, description = "Resend accepted")
    ),
    tag = "auth"
)]
pub async fn resend_passcode(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendPasscodeRequest>>,
) -> impl IntoResponse {
    let request: ResendPasscodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };

    let contact = normalize_contact(request.channel, &request.contact);

    match resend(&pool, request.channel, &contact, &auth_state).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            // Keep the response opaque even on backend failure.
            error!("Failed to resend passcode: {err}");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

async fn resend(
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

    if account.status != "pending_verification" {
        // Active accounts request login passcodes through /v1/auth/passcode/send.
        tx.commit().await?;
        return Ok(());
    }

    if channel == Channel::Phone && !account.email_verified {
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
    use super::{resend_passcode, verify_passcode};
    use crate::api::handlers::auth::types::{Channel, VerifyPasscodeRequest};
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
    async fn verify_passcode_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = verify_passcode(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_passcode_empty_code() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = verify_passcode(
            Extension(pool),
            Extension(auth_state()),
            Some(Json(VerifyPasscodeRequest {
                contact: "a@example.com".to_string(),
                channel: Channel::Email,
                code: "  ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn resend_passcode_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = resend_passcode(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
