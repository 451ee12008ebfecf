//! Queries for the bookings table and the listing quantity ledger.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{Booking, BookingStatus, CreateBookingRequest};

const BOOKING_COLUMNS: &str = r"
    id, food_listing_id, buyer_id, lister_id, quantity_requested,
    pickup_time, buyer_notes, lister_notes, total_amount, status,
    created_at, updated_at
";

/// Listing fields a booking decision needs.
pub(super) struct BookableListing {
    pub(super) lister_id: Uuid,
    pub(super) quantity: i32,
    pub(super) price: Decimal,
}

pub(super) struct BookingRow {
    pub(super) food_listing_id: Uuid,
    pub(super) buyer_id: Uuid,
    pub(super) lister_id: Uuid,
    pub(super) quantity_requested: i32,
    pub(super) status: String,
}

fn booking_from_row(row: &sqlx::postgres::PgRow) -> Booking {
    Booking {
        id: row.get("id"),
        food_listing_id: row.get("food_listing_id"),
        buyer_id: row.get("buyer_id"),
        lister_id: row.get("lister_id"),
        quantity_requested: row.get("quantity_requested"),
        pickup_time: row.get("pickup_time"),
        buyer_notes: row.get("buyer_notes"),
        lister_notes: row.get("lister_notes"),
        total_amount: row.get("total_amount"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Fetch an available listing for booking validation.
pub(super) async fn lookup_bookable_listing(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    listing_id: Uuid,
) -> Result<Option<BookableListing>> {
    let query = r"
        SELECT lister_id, quantity, price
        FROM food_listings
        WHERE id = $1
          AND is_available
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(listing_id)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to fetch listing for booking")?;

    Ok(row.map(|row| BookableListing {
        lister_id: row.get("lister_id"),
        quantity: row.get("quantity"),
        price: row.get("price"),
    }))
}

/// Atomically take `quantity` units off a listing.
///
/// The WHERE clause re-checks availability so a concurrent booking that
/// drained the listing between validation and this statement makes it affect
/// zero rows. Returns whether the decrement landed.
pub(super) async fn decrement_listing_quantity(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    listing_id: Uuid,
    quantity: i32,
) -> Result<bool> {
    let query = r"
        UPDATE food_listings
        SET quantity = quantity - $2,
            is_available = quantity - $2 > 0,
            updated_at = NOW()
        WHERE id = $1
          AND is_available
          AND quantity >= $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(listing_id)
        .bind(quantity)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to decrement listing quantity")?;

    Ok(result.rows_affected() == 1)
}

/// Give booked units back to the listing after a cancellation.
pub(super) async fn restore_listing_quantity(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    listing_id: Uuid,
    quantity: i32,
) -> Result<()> {
    let query = r"
        UPDATE food_listings
        SET quantity = quantity + $2,
            is_available = TRUE,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(listing_id)
        .bind(quantity)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to restore listing quantity")?;

    Ok(())
}

pub(super) async fn insert_booking(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    buyer_id: Uuid,
    lister_id: Uuid,
    total_amount: Decimal,
    request: &CreateBookingRequest,
) -> Result<Booking> {
    let query = format!(
        r"
        INSERT INTO bookings
            (food_listing_id, buyer_id, lister_id, quantity_requested,
             pickup_time, buyer_notes, total_amount, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
        RETURNING {BOOKING_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(request.food_listing_id)
        .bind(buyer_id)
        .bind(lister_id)
        .bind(request.quantity_requested)
        .bind(request.pickup_time)
        .bind(&request.buyer_notes)
        .bind(total_amount)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert booking")?;

    Ok(booking_from_row(&row))
}

/// Lock a booking the caller is a party to. Bookings of other accounts are
/// indistinguishable from missing ones.
pub(super) async fn lock_booking_for_party(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
    account_id: Uuid,
) -> Result<Option<BookingRow>> {
    let query = r"
        SELECT food_listing_id, buyer_id, lister_id, quantity_requested, status
        FROM bookings
        WHERE id = $1
          AND (buyer_id = $2 OR lister_id = $2)
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(booking_id)
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to lock booking")?;

    Ok(row.map(|row| BookingRow {
        food_listing_id: row.get("food_listing_id"),
        buyer_id: row.get("buyer_id"),
        lister_id: row.get("lister_id"),
        quantity_requested: row.get("quantity_requested"),
        status: row.get("status"),
    }))
}

pub(super) async fn update_booking_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
    status: BookingStatus,
    lister_notes: Option<&str>,
) -> Result<Booking> {
    let query = format!(
        r"
        UPDATE bookings
        SET status = $2,
            lister_notes = COALESCE($3, lister_notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(booking_id)
        .bind(status.as_str())
        .bind(lister_notes)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await
        .context("failed to update booking status")?;

    Ok(booking_from_row(&row))
}

pub(super) async fn insert_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    title: &str,
    message: &str,
    kind: &str,
    related_booking_id: Uuid,
) -> Result<()> {
    let query = r"
        INSERT INTO notifications (account_id, title, message, kind, related_booking_id)
        VALUES ($1, $2, $3, $4, $5)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(related_booking_id)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert notification")?;

    Ok(())
}

/// Bookings the account is a party to, newest first.
pub(super) async fn bookings_for_account(pool: &PgPool, account_id: Uuid) -> Result<Vec<Booking>> {
    let query = format!(
        r"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE buyer_id = $1 OR lister_id = $1
        ORDER BY created_at DESC
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(account_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch bookings")?;

    Ok(rows.iter().map(booking_from_row).collect())
}
