//! Request/response types for auth endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role. Listers publish food listings; buyers book against them.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Lister,
}

impl Role {
    #[must_use]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Lister => "lister",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "buyer" => Some(Self::Buyer),
            "lister" => Some(Self::Lister),
            _ => None,
        }
    }

    /// Frontend route the client lands on after full verification.
    #[must_use]
    pub(crate) fn dashboard_path(self) -> &'static str {
        match self {
            Self::Buyer => "/buyer-dashboard",
            Self::Lister => "/lister-dashboard",
        }
    }
}

/// Verification channel for one-time passcodes.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Phone,
}

impl Channel {
    #[must_use]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub phone: String,
    #[schema(value_type = String)]
    pub password: SecretString,
    pub role: Role,
    pub full_name: String,
    pub organization_name: Option<String>,
    pub address: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SignupResponse {
    pub message: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct VerifyPasscodeRequest {
    pub contact: String,
    pub channel: Channel,
    pub code: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifyPasscodeResponse {
    pub email_verified: bool,
    pub phone_verified: bool,
    /// True once both channels are verified (or on passcode login).
    pub complete: bool,
    /// Dashboard path for the account role, set when `complete` is true.
    pub redirect_to: Option<String>,
    /// Bearer token, set when this verification opened a session.
    pub token: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ResendPasscodeRequest {
    pub contact: String,
    pub channel: Channel,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SendPasscodeRequest {
    pub contact: String,
    pub channel: Channel,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub redirect_to: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SessionResponse {
    #[schema(value_type = String)]
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn role_round_trips_lowercase() -> Result<()> {
        let value = serde_json::to_value(Role::Lister)?;
        assert_eq!(value, serde_json::json!("lister"));
        let decoded: Role = serde_json::from_value(serde_json::json!("buyer"))?;
        assert_eq!(decoded, Role::Buyer);
        assert_eq!(Role::parse("lister"), Some(Role::Lister));
        assert_eq!(Role::parse("admin"), None);
        Ok(())
    }

    #[test]
    fn dashboard_paths_match_roles() {
        assert_eq!(Role::Buyer.dashboard_path(), "/buyer-dashboard");
        assert_eq!(Role::Lister.dashboard_path(), "/lister-dashboard");
    }

    #[test]
    fn signup_request_deserializes() -> Result<()> {
        let request: SignupRequest = serde_json::from_value(serde_json::json!({
            "email": "alice@example.com",
            "phone": "+15551234567",
            "password": "hunter2hunter2",
            "role": "lister",
            "full_name": "Alice Lister",
            "organization_name": "Food Rescue",
        }))?;
        assert_eq!(request.email, "alice@example.com");
        assert_eq!(request.role, Role::Lister);
        assert!(request.address.is_none());
        request
            .organization_name
            .as_deref()
            .context("missing organization")?;
        Ok(())
    }

    #[test]
    fn channel_serializes_lowercase() -> Result<()> {
        let value = serde_json::to_value(Channel::Phone)?;
        assert_eq!(value, serde_json::json!("phone"));
        Ok(())
    }
}
