use crate::api;
use crate::api::handlers::auth::AuthConfig;
use crate::api::outbox::OutboxWorkerConfig;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            frontend_url,
            passcode_ttl_seconds,
            resend_cooldown_seconds,
        } => {
            let auth_config = AuthConfig::new(frontend_url)
                .with_passcode_ttl_seconds(passcode_ttl_seconds)
                .with_resend_cooldown_seconds(resend_cooldown_seconds);

            api::new(port, dsn, auth_config, OutboxWorkerConfig::new().normalize()).await?;
        }
    }

    Ok(())
}
