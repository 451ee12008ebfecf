//! Food listing endpoints.

pub mod storage;
pub mod types;

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;

use super::auth::principal::require_auth;
use super::auth::Role;
use super::ApiError;
use types::{CreateListingRequest, ListingResponse, ListingsResponse};

/// Create a food listing. Lister accounts only.
#[utoipa::path(
    post,
    path = "/v1/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a lister")
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn create_listing(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CreateListingRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    if principal.role != Role::Lister {
        return ApiError::Forbidden("Only listers can create food listings").into_response();
    }

    let request: CreateListingRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };

    if request.title.trim().is_empty() {
        return ApiError::Validation("Missing title".to_string()).into_response();
    }
    if request.quantity <= 0 {
        return ApiError::Validation("Quantity must be positive".to_string()).into_response();
    }
    if request.price.is_some_and(|price| price.is_sign_negative()) {
        return ApiError::Validation("Price cannot be negative".to_string()).into_response();
    }

    match storage::insert_listing(&pool, principal.account_id, &request).await {
        Ok(listing) => (
            StatusCode::CREATED,
            Json(ListingResponse {
                success: true,
                listing,
            }),
        )
            .into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

/// Browse listings still open for booking.
#[utoipa::path(
    get,
    path = "/v1/listings",
    responses(
        (status = 200, description = "Available listings", body = ListingsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn list_available(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &pool).await {
        return err.into_response();
    }
    match storage::available_listings(&pool).await {
        Ok(listings) => Json(ListingsResponse { listings }).into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

/// The caller's own listings, sold-out ones included.
#[utoipa::path(
    get,
    path = "/v1/listings/mine",
    responses(
        (status = 200, description = "Caller's listings", body = ListingsResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a lister")
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn list_mine(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    if principal.role != Role::Lister {
        return ApiError::Forbidden("Only listers have listings").into_response();
    }
    match storage::listings_by_lister(&pool, principal.account_id).await {
        Ok(listings) => Json(ListingsResponse { listings }).into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::{create_listing, list_available};
    use anyhow::Result;
    use axum::extract::Extension;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn create_listing_requires_bearer() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = create_listing(Extension(pool), HeaderMap::new(), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn list_available_requires_bearer() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = list_available(Extension(pool), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
