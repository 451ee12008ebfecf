//! Auth state and configuration.

use url::Url;

const DEFAULT_PASSCODE_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_RESEND_COOLDOWN_SECONDS: i64 = 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    passcode_ttl_seconds: i64,
    resend_cooldown_seconds: i64,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        // Normalize to an origin-shaped URL; callers pass whatever the CLI got.
        let frontend_base_url = Url::parse(&frontend_base_url)
            .map_or(frontend_base_url, |url| {
                url.to_string().trim_end_matches('/').to_string()
            });

        Self {
            frontend_base_url,
            passcode_ttl_seconds: DEFAULT_PASSCODE_TTL_SECONDS,
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_passcode_ttl_seconds(mut self, seconds: i64) -> Self {
        self.passcode_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn passcode_ttl_seconds(&self) -> i64 {
        self.passcode_ttl_seconds
    }

    #[must_use]
    pub fn resend_cooldown_seconds(&self) -> i64 {
        self.resend_cooldown_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }
}

/// Shared auth state injected into handlers as an extension.
#[derive(Clone, Debug)]
pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = AuthConfig::new("http://localhost:5173".to_string());
        assert_eq!(config.passcode_ttl_seconds(), 600);
        assert_eq!(config.resend_cooldown_seconds(), 60);
        assert_eq!(config.session_ttl_seconds(), 12 * 60 * 60);
        assert_eq!(config.frontend_base_url(), "http://localhost:5173");
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new("https://foodflow.dev/".to_string())
            .with_passcode_ttl_seconds(120)
            .with_resend_cooldown_seconds(30)
            .with_session_ttl_seconds(3600);
        assert_eq!(config.passcode_ttl_seconds(), 120);
        assert_eq!(config.resend_cooldown_seconds(), 30);
        assert_eq!(config.session_ttl_seconds(), 3600);
        assert_eq!(config.frontend_base_url(), "https://foodflow.dev");
    }
}
