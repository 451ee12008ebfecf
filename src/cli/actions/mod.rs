pub mod server;

/// Actions the CLI can dispatch.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        frontend_url: String,
        passcode_ttl_seconds: i64,
        resend_cooldown_seconds: i64,
    },
}
