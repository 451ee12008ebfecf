use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: Option<String>,
    pub food_type: String,
    pub quantity: i32,
    pub unit: String,
    pub pickup_location: String,
    #[schema(value_type = Option<String>)]
    pub pickup_time_start: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub pickup_time_end: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Omitted or zero means a free donation.
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub special_instructions: Option<String>,
    pub contact_phone: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub lister_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub food_type: String,
    pub quantity: i32,
    pub unit: String,
    pub pickup_location: String,
    #[schema(value_type = Option<String>)]
    pub pickup_time_start: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub pickup_time_end: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub special_instructions: Option<String>,
    pub contact_phone: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// Mutating responses keep the `{"success": true, "listing": ...}` shape the
/// frontend consumes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingResponse {
    pub success: bool,
    pub listing: Listing,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingsResponse {
    pub listings: Vec<Listing>,
}

#[cfg(test)]
mod tests {
    use super::CreateListingRequest;
    use anyhow::Result;

    #[test]
    fn create_listing_request_optional_fields() -> Result<()> {
        let request: CreateListingRequest = serde_json::from_str(
            r#"{
                "title": "Day-old bread",
                "food_type": "bakery",
                "quantity": 12,
                "unit": "loaves",
                "pickup_location": "12 Baker St"
            }"#,
        )?;
        assert_eq!(request.title, "Day-old bread");
        assert!(request.price.is_none());
        assert!(request.pickup_time_start.is_none());
        Ok(())
    }
}
