use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Booking lifecycle. `pending` on creation, advanced by the lister,
/// `cancelled` is terminal for both parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub food_listing_id: Uuid,
    pub quantity_requested: i32,
    #[schema(value_type = Option<String>)]
    pub pickup_time: Option<DateTime<Utc>>,
    pub buyer_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
    pub lister_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub food_listing_id: Uuid,
    pub buyer_id: Uuid,
    pub lister_id: Uuid,
    pub quantity_requested: i32,
    #[schema(value_type = Option<String>)]
    pub pickup_time: Option<DateTime<Utc>>,
    pub buyer_notes: Option<String>,
    pub lister_notes: Option<String>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub status: String,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// `{"success": true, "booking": ...}`, the shape the frontend consumes.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingsResponse {
    pub bookings: Vec<Booking>,
}

#[cfg(test)]
mod tests {
    use super::BookingStatus;

    #[test]
    fn status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("returned"), None);
    }

    #[test]
    fn status_deserializes_lowercase() {
        let status: BookingStatus = serde_json::from_str(r#""cancelled""#).unwrap();
        assert_eq!(status, BookingStatus::Cancelled);
    }
}
