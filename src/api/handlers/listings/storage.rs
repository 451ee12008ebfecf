//! Queries for the food_listings table.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{CreateListingRequest, Listing};

const LISTING_COLUMNS: &str = r"
    id, lister_id, title, description, food_type, quantity, unit,
    pickup_location, pickup_time_start, pickup_time_end, expiry_date,
    price, special_instructions, contact_phone, image_url, is_available,
    created_at, updated_at
";

fn listing_from_row(row: &sqlx::postgres::PgRow) -> Listing {
    Listing {
        id: row.get("id"),
        lister_id: row.get("lister_id"),
        title: row.get("title"),
        description: row.get("description"),
        food_type: row.get("food_type"),
        quantity: row.get("quantity"),
        unit: row.get("unit"),
        pickup_location: row.get("pickup_location"),
        pickup_time_start: row.get("pickup_time_start"),
        pickup_time_end: row.get("pickup_time_end"),
        expiry_date: row.get("expiry_date"),
        price: row.get("price"),
        special_instructions: row.get("special_instructions"),
        contact_phone: row.get("contact_phone"),
        image_url: row.get("image_url"),
        is_available: row.get("is_available"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Insert a listing owned by the given lister. Availability follows from the
/// initial quantity.
pub(super) async fn insert_listing(
    pool: &PgPool,
    lister_id: Uuid,
    request: &CreateListingRequest,
) -> Result<Listing> {
    let query = format!(
        r"
        INSERT INTO food_listings
            (lister_id, title, description, food_type, quantity, unit,
             pickup_location, pickup_time_start, pickup_time_end, expiry_date,
             price, special_instructions, contact_phone, image_url, is_available)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $5 > 0)
        RETURNING {LISTING_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(lister_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.food_type)
        .bind(request.quantity)
        .bind(&request.unit)
        .bind(&request.pickup_location)
        .bind(request.pickup_time_start)
        .bind(request.pickup_time_end)
        .bind(request.expiry_date)
        .bind(request.price.unwrap_or_default())
        .bind(&request.special_instructions)
        .bind(&request.contact_phone)
        .bind(&request.image_url)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert food listing")?;

    Ok(listing_from_row(&row))
}

/// Listings open for booking, newest first.
pub(super) async fn available_listings(pool: &PgPool) -> Result<Vec<Listing>> {
    let query = format!(
        r"
        SELECT {LISTING_COLUMNS}
        FROM food_listings
        WHERE is_available
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
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch available listings")?;

    Ok(rows.iter().map(listing_from_row).collect())
}

/// All listings owned by the lister, including sold-out ones.
pub(super) async fn listings_by_lister(pool: &PgPool, lister_id: Uuid) -> Result<Vec<Listing>> {
    let query = format!(
        r"
        SELECT {LISTING_COLUMNS}
        FROM food_listings
        WHERE lister_id = $1
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
        .bind(lister_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch lister listings")?;

    Ok(rows.iter().map(listing_from_row).collect())
}
