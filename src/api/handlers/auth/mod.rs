//! Account signup, dual-channel passcode verification, and bearer sessions.

pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod progress;
pub(crate) mod session;
pub(crate) mod signup;
pub(crate) mod state;
pub(crate) mod storage;
pub(crate) mod types;
pub(crate) mod utils;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};
pub use types::{Channel, Role};
