//! Booking endpoints: creation, status updates, and listing.

pub mod storage;
pub mod types;

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::auth::principal::{require_auth, Principal};
use super::auth::Role;
use super::ApiError;
use storage::BookingRow;
use types::{
    BookingResponse, BookingStatus, BookingsResponse, CreateBookingRequest,
    UpdateBookingStatusRequest,
};

/// Book units off an available listing. Buyer accounts only.
///
/// Validation reads the listing, but the decrement itself re-checks quantity
/// and availability in a single conditional UPDATE. A concurrent booking that
/// wins the race leaves this one with zero affected rows and a 409.
#[utoipa::path(
    post,
    path = "/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a buyer"),
        (status = 404, description = "Listing missing or unavailable"),
        (status = 409, description = "Listing drained concurrently")
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CreateBookingRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    if principal.role != Role::Buyer {
        return ApiError::Forbidden("Only buyers can create bookings").into_response();
    }

    let request: CreateBookingRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };
    if request.quantity_requested <= 0 {
        return ApiError::Validation("Requested quantity must be positive".to_string())
            .into_response();
    }

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            return ApiError::Backend(anyhow::Error::from(err).context("begin booking transaction"))
                .into_response()
        }
    };

    let listing = match storage::lookup_bookable_listing(&mut tx, request.food_listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => {
            let _ = tx.rollback().await;
            return ApiError::NotFound("Food listing not found or not available").into_response();
        }
        Err(err) => {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    };

    // Never clamp; the listing is untouched when the request over-asks.
    if request.quantity_requested > listing.quantity {
        let _ = tx.rollback().await;
        return ApiError::Validation("Requested quantity exceeds available quantity".to_string())
            .into_response();
    }

    match storage::decrement_listing_quantity(
        &mut tx,
        request.food_listing_id,
        request.quantity_requested,
    )
    .await
    {
        Ok(true) => {}
        Ok(false) => {
            let _ = tx.rollback().await;
            return ApiError::Oversold.into_response();
        }
        Err(err) => {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    }

    let total_amount = listing.price * Decimal::from(request.quantity_requested);
    let booking = match storage::insert_booking(
        &mut tx,
        principal.account_id,
        listing.lister_id,
        total_amount,
        &request,
    )
    .await
    {
        Ok(booking) => booking,
        Err(err) => {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    };

    if let Err(err) = tx.commit().await {
        return ApiError::Backend(anyhow::Error::from(err).context("commit booking"))
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(BookingResponse {
            success: true,
            booking,
        }),
    )
        .into_response()
}

/// Advance or cancel a booking.
///
/// The lister may set any status and attach notes; the buyer may only cancel.
/// Cancellation restores the booked units and re-opens the listing in the
/// same transaction. A cancelled booking is terminal: no transition out of it
/// is accepted, so restoration can never double-apply.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Transition not allowed for this role"),
        (status = 404, description = "Booking missing or not caller's"),
        (status = 409, description = "Booking already cancelled")
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn update_status(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Path(booking_id): Path<Uuid>,
    payload: Option<Json<UpdateBookingStatusRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    let request: UpdateBookingStatusRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ApiError::Validation("Missing payload".to_string()).into_response(),
    };

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            return ApiError::Backend(anyhow::Error::from(err).context("begin status transaction"))
                .into_response()
        }
    };

    // Party scoping happens in the query itself; a booking the caller is not
    // a party to looks exactly like a missing one.
    let booking = match storage::lock_booking_for_party(&mut tx, booking_id, principal.account_id)
        .await
    {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            let _ = tx.rollback().await;
            return ApiError::NotFound("Booking not found or access denied").into_response();
        }
        Err(err) => {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    };

    if let Err(err) = validate_transition(&principal, &booking, request.status) {
        let _ = tx.rollback().await;
        return err.into_response();
    }

    let lister_notes = if principal.role == Role::Lister {
        request.lister_notes.as_deref()
    } else {
        None
    };
    let updated =
        match storage::update_booking_status(&mut tx, booking_id, request.status, lister_notes)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                let _ = tx.rollback().await;
                return ApiError::Backend(err).into_response();
            }
        };

    if request.status == BookingStatus::Cancelled {
        if let Err(err) = storage::restore_listing_quantity(
            &mut tx,
            booking.food_listing_id,
            booking.quantity_requested,
        )
        .await
        {
            let _ = tx.rollback().await;
            return ApiError::Backend(err).into_response();
        }
    }

    let recipient = if booking.buyer_id == principal.account_id {
        booking.lister_id
    } else {
        booking.buyer_id
    };
    let (message, kind) = notification_for(request.status);
    if let Err(err) = storage::insert_notification(
        &mut tx,
        recipient,
        "Booking Update",
        &message,
        kind,
        booking_id,
    )
    .await
    {
        let _ = tx.rollback().await;
        return ApiError::Backend(err).into_response();
    }

    if let Err(err) = tx.commit().await {
        return ApiError::Backend(anyhow::Error::from(err).context("commit status update"))
            .into_response();
    }

    Json(BookingResponse {
        success: true,
        booking: updated,
    })
    .into_response()
}

fn validate_transition(
    principal: &Principal,
    booking: &BookingRow,
    status: BookingStatus,
) -> Result<(), ApiError> {
    match principal.role {
        Role::Lister if booking.lister_id == principal.account_id => {}
        Role::Buyer if booking.buyer_id == principal.account_id => {
            if status != BookingStatus::Cancelled {
                return Err(ApiError::Forbidden("Buyers can only cancel their bookings"));
            }
        }
        _ => return Err(ApiError::Forbidden("Access denied")),
    }

    // `cancelled` is terminal for every caller. Reopening a cancelled booking
    // would let a later cancel restore the same units a second time, pushing
    // the listing above its original quantity.
    if booking.status == "cancelled" {
        return Err(ApiError::Conflict("Booking is already cancelled"));
    }

    Ok(())
}

/// Message template for the party that did not make the change.
fn notification_for(status: BookingStatus) -> (String, &'static str) {
    match status {
        BookingStatus::Confirmed => ("Your booking has been confirmed!".to_string(), "info"),
        BookingStatus::Cancelled => ("A booking has been cancelled.".to_string(), "warning"),
        other => (
            format!("Booking status updated to {}.", other.as_str()),
            "info",
        ),
    }
}

/// Bookings where the caller is buyer or lister.
#[utoipa::path(
    get,
    path = "/v1/bookings",
    responses(
        (status = 200, description = "Caller's bookings", body = BookingsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "bookings"
)]
pub async fn list_bookings(pool: Extension<PgPool>, headers: HeaderMap) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    match storage::bookings_for_account(&pool, principal.account_id).await {
        Ok(bookings) => Json(BookingsResponse { bookings }).into_response(),
        Err(err) => ApiError::Backend(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::storage::BookingRow;
    use super::types::BookingStatus;
    use super::{create_booking, notification_for, validate_transition};
    use crate::api::handlers::auth::principal::Principal;
    use crate::api::handlers::auth::Role;
    use anyhow::Result;
    use axum::extract::Extension;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn booking(buyer_id: Uuid, lister_id: Uuid, status: &str) -> BookingRow {
        BookingRow {
            food_listing_id: Uuid::new_v4(),
            buyer_id,
            lister_id,
            quantity_requested: 3,
            status: status.to_string(),
        }
    }

    fn principal(account_id: Uuid, role: Role) -> Principal {
        Principal {
            account_id,
            email: "a@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn lister_may_set_any_status() {
        let lister = Uuid::new_v4();
        let row = booking(Uuid::new_v4(), lister, "pending");
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert!(validate_transition(&principal(lister, Role::Lister), &row, status).is_ok());
        }
    }

    #[test]
    fn buyer_may_only_cancel() {
        let buyer = Uuid::new_v4();
        let row = booking(buyer, Uuid::new_v4(), "pending");
        let caller = principal(buyer, Role::Buyer);
        assert!(validate_transition(&caller, &row, BookingStatus::Cancelled).is_ok());
        assert!(validate_transition(&caller, &row, BookingStatus::Confirmed).is_err());
        assert!(validate_transition(&caller, &row, BookingStatus::Completed).is_err());
    }

    #[test]
    fn mismatched_party_is_denied() {
        let row = booking(Uuid::new_v4(), Uuid::new_v4(), "pending");
        let stranger = principal(Uuid::new_v4(), Role::Lister);
        assert!(validate_transition(&stranger, &row, BookingStatus::Confirmed).is_err());
    }

    // Restoration applies on every cancel transition, so a cancelled booking
    // must reject ALL further updates: letting the lister move it back to
    // confirmed would arm a second cancel and a second +q restoration.
    #[test]
    fn cancelled_is_terminal_for_both_parties() {
        let buyer = Uuid::new_v4();
        let lister = Uuid::new_v4();
        let row = booking(buyer, lister, "cancelled");
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            let denied = validate_transition(&principal(lister, Role::Lister), &row, status)
                .unwrap_err()
                .into_response();
            assert_eq!(denied.status(), StatusCode::CONFLICT);
        }
        let re_cancel = validate_transition(
            &principal(buyer, Role::Buyer),
            &row,
            BookingStatus::Cancelled,
        )
        .unwrap_err()
        .into_response();
        assert_eq!(re_cancel.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn notification_templates() {
        assert_eq!(
            notification_for(BookingStatus::Confirmed).0,
            "Your booking has been confirmed!"
        );
        let (message, kind) = notification_for(BookingStatus::Cancelled);
        assert_eq!(message, "A booking has been cancelled.");
        assert_eq!(kind, "warning");
        assert_eq!(
            notification_for(BookingStatus::Completed).0,
            "Booking status updated to completed."
        );
    }

    #[tokio::test]
    async fn create_booking_requires_bearer() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = create_booking(Extension(pool), HeaderMap::new(), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
