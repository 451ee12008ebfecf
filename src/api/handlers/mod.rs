pub mod auth;
pub mod bookings;
pub mod error;
pub mod health;
pub mod listings;
pub mod notifications;

pub(crate) use error::ApiError;
