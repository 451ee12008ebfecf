//! Notification read-back for dashboards.

use anyhow::{Context, Result};
use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::require_auth;
use super::ApiError;

#[derive(Debug, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub related_booking_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub read_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/v1/notifications",
    responses(
        (status = 200, description = "Caller's notifications", body = NotificationsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    match notifications_for_account(&pool, principal.account_id).await {
        Ok(notifications) => Json(NotificationsResponse { notifications }).into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

async fn notifications_for_account(pool: &PgPool, account_id: Uuid) -> Result<Vec<Notification>> {
    let query = r"
        SELECT id, title, message, kind, related_booking_id, read_at, created_at
        FROM notifications
        WHERE account_id = $1
        ORDER BY created_at DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(account_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch notifications")?;

    Ok(rows
        .iter()
        .map(|row| Notification {
            id: row.get("id"),
            title: row.get("title"),
            message: row.get("message"),
            kind: row.get("kind"),
            related_booking_id: row.get("related_booking_id"),
            read_at: row.get("read_at"),
            created_at: row.get("created_at"),
        })
        .collect())
}
