use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
        frontend_url: matches
            .get_one("frontend-url")
            .map(|s: &String| s.to_string())
            .unwrap_or_else(|| "http://localhost:5173".to_string()),
        passcode_ttl_seconds: matches
            .get_one::<i64>("passcode-ttl")
            .copied()
            .unwrap_or(600),
        resend_cooldown_seconds: matches
            .get_one::<i64>("resend-cooldown")
            .copied()
            .unwrap_or(60),
    })
}
