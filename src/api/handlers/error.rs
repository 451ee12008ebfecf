//! Failure taxonomy shared by all handlers.
//!
//! Every failure surfaces as a JSON body of the shape `{"error": "..."}` so
//! clients have a single place to look for a human-readable message, while the
//! HTTP status code carries the failure kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Missing/invalid bearer token or failed credentials.
    Unauthorized(&'static str),
    /// Caller role or ownership does not permit the action.
    Forbidden(&'static str),
    /// Referenced row is absent, deactivated, or not visible to the caller.
    NotFound(&'static str),
    /// Request payload failed validation.
    Validation(String),
    /// State conflict: duplicate email/phone, or a terminal booking status.
    Conflict(&'static str),
    /// The atomic quantity guard matched zero rows: a concurrent booking won.
    Oversold,
    /// The underlying store failed; details are logged, never leaked.
    Backend(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::Oversold => StatusCode::CONFLICT,
            Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => message.to_string(),
            Self::Validation(message) => message,
            Self::Oversold => "Listing quantity changed concurrently, please retry".to_string(),
            Self::Backend(err) => {
                error!("Backend error: {err:#}");
                "Internal error".to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn statuses_match_failure_kinds() {
        let cases = [
            (
                ApiError::Unauthorized("No authorization header").into_response(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Forbidden("Only buyers can create bookings").into_response(),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::NotFound("Booking not found or access denied").into_response(),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Validation("Requested quantity exceeds available quantity".to_string())
                    .into_response(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Conflict("Account already exists").into_response(),
                StatusCode::CONFLICT,
            ),
            (ApiError::Oversold.into_response(), StatusCode::CONFLICT),
            (
                ApiError::Backend(anyhow::anyhow!("boom")).into_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (response, expected) in cases {
            assert_eq!(response.status(), expected);
        }
    }
}
