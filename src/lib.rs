//! # Foodflow (food donation marketplace API)
//!
//! `foodflow` is the backend for a food-donation marketplace: listers publish
//! surplus food listings, buyers book quantities against them, and both sides
//! authenticate through a dual-channel (email + phone) passcode signup flow.
//!
//! ## Accounts & Verification
//!
//! Signup creates a `pending_verification` account and sends a 6-digit
//! passcode to the email channel. The phone passcode is dispatched only after
//! the email passcode is verified; the account becomes `active` once both
//! channels are verified, regardless of the order in which they complete.
//!
//! - **Passcodes:** 6-digit numeric, short-lived, stored hashed. Resends are
//!   rate limited server-side with a per-channel cooldown.
//! - **Sessions:** bearer tokens (random, stored hashed) presented in the
//!   `Authorization` header.
//!
//! ## Inventory
//!
//! Booking creation and cancellation mutate listing quantity through atomic
//! conditional updates (`WHERE quantity >= requested`), so concurrent bookings
//! against the same listing can never oversell. A conditional update that
//! matches zero rows after validation surfaces as a `409` conflict.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
