//! OpenAPI document for the HTTP surface, also exported by the `openapi`
//! binary for client generation.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::{auth, bookings, listings, notifications};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "foodflow",
        description = "Food donation marketplace API",
        license(name = "BSD-3-Clause")
    ),
    paths(
        super::handlers::health::health,
        auth::signup::signup,
        auth::verification::verify_passcode,
        auth::verification::resend_passcode,
        auth::login::send_login_passcode,
        auth::login::login,
        auth::session::session,
        auth::session::logout,
        listings::create_listing,
        listings::list_available,
        listings::list_mine,
        bookings::create_booking,
        bookings::update_status,
        bookings::list_bookings,
        notifications::list_notifications,
    ),
    components(schemas(
        auth::types::Role,
        auth::types::Channel,
        auth::types::SignupRequest,
        auth::types::SignupResponse,
        auth::types::VerifyPasscodeRequest,
        auth::types::VerifyPasscodeResponse,
        auth::types::ResendPasscodeRequest,
        auth::types::SendPasscodeRequest,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::SessionResponse,
        listings::types::CreateListingRequest,
        listings::types::Listing,
        listings::types::ListingResponse,
        listings::types::ListingsResponse,
        bookings::types::BookingStatus,
        bookings::types::CreateBookingRequest,
        bookings::types::UpdateBookingStatusRequest,
        bookings::types::Booking,
        bookings::types::BookingResponse,
        bookings::types::BookingsResponse,
        notifications::Notification,
        notifications::NotificationsResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service status"),
        (name = "auth", description = "Signup, verification, and sessions"),
        (name = "listings", description = "Food listings"),
        (name = "bookings", description = "Bookings against listings"),
        (name = "notifications", description = "Per-account notifications")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::openapi;

    #[test]
    fn document_lists_all_routes() {
        let doc = openapi();
        for path in [
            "/health",
            "/v1/auth/signup",
            "/v1/auth/passcode/verify",
            "/v1/auth/passcode/resend",
            "/v1/auth/passcode/send",
            "/v1/auth/login",
            "/v1/auth/session",
            "/v1/auth/logout",
            "/v1/listings",
            "/v1/listings/mine",
            "/v1/bookings",
            "/v1/bookings/{id}/status",
            "/v1/notifications",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path: {path}"
            );
        }
    }

    #[test]
    fn document_serializes() {
        let json = serde_json::to_string(&openapi()).unwrap();
        assert!(json.contains("foodflow"));
    }
}
