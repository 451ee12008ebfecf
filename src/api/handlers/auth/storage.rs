//! Database helpers for accounts, passcode challenges, and sessions.

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::state::AuthConfig;
use super::types::{Channel, Role};
use super::utils::{
    generate_passcode, generate_session_token, hash_passcode, hash_session_token,
    is_unique_violation,
};

/// Outcome when attempting to create a new account + passcode challenge.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created,
    Conflict,
}

/// Account fields needed by the passcode verification flow.
#[derive(Debug)]
pub(super) struct AccountRow {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) phone: String,
    pub(super) role: String,
    pub(super) status: String,
    pub(super) email_verified: bool,
    pub(super) phone_verified: bool,
}

/// Minimal fields needed for password login.
pub(super) struct LoginRecord {
    pub(super) account_id: Uuid,
    pub(super) status: String,
    pub(super) password_hash: String,
    pub(super) role: String,
}

/// Minimal data returned for a valid bearer token.
pub(crate) struct SessionRecord {
    pub(crate) account_id: Uuid,
    pub(crate) email: String,
    pub(crate) role: String,
}

pub(super) struct NewAccount<'a> {
    pub(super) email: &'a str,
    pub(super) phone: &'a str,
    pub(super) password_hash: &'a str,
    pub(super) role: Role,
    pub(super) full_name: &'a str,
    pub(super) organization_name: Option<&'a str>,
    pub(super) address: Option<&'a str>,
}

/// Create the account and its first email passcode challenge in one transaction.
pub(super) async fn insert_account_and_challenge(
    pool: &PgPool,
    account: &NewAccount<'_>,
    config: &AuthConfig,
) -> Result<SignupOutcome> {
    // Account creation, the email challenge, and the outbox row stay
    // consistent even if any step fails.
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = r"
        INSERT INTO accounts
            (email, phone, password_hash, role, full_name, organization_name, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account.email)
        .bind(account.phone)
        .bind(account.password_hash)
        .bind(account.role.as_str())
        .bind(account.full_name)
        .bind(account.organization_name)
        .bind(account.address)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let account_id: Uuid = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(SignupOutcome::Conflict);
            }
            return Err(err).context("failed to insert account");
        }
    };

    // Email goes out first; the phone challenge waits for email verification.
    let _code =
        insert_passcode_records(&mut tx, account_id, Channel::Email, account.email, config).await?;

    tx.commit().await.context("commit signup transaction")?;

    Ok(SignupOutcome::Created)
}

/// Create a passcode challenge and enqueue its delivery message.
/// Returns the raw code (only ever handed to the outbox payload).
pub(super) async fn insert_passcode_records(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    channel: Channel,
    recipient: &str,
    config: &AuthConfig,
) -> Result<String> {
    let code = generate_passcode()?;
    let code_hash = hash_passcode(&code);

    let query = r"
        INSERT INTO passcode_challenges
            (account_id, channel, code_hash, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(channel.as_str())
        .bind(&code_hash)
        .bind(config.passcode_ttl_seconds())
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert passcode challenge")?;

    let template = match channel {
        Channel::Email => "passcode_email",
        Channel::Phone => "passcode_sms",
    };
    let payload_text = serde_json::to_string(&json!({
        "recipient": recipient,
        "code": code,
        "ttl_seconds": config.passcode_ttl_seconds(),
    }))
    .context("failed to serialize passcode payload")?;

    let query = r"
        INSERT INTO message_outbox (channel, recipient, template, payload_json)
        VALUES ($1, $2, $3, $4::jsonb)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(channel.as_str())
        .bind(recipient)
        .bind(template)
        .bind(payload_text)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert outbox row")?;

    Ok(code)
}

/// Look up an account by the contact value for the given channel.
pub(super) async fn lookup_account_by_contact(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    channel: Channel,
    contact: &str,
) -> Result<Option<AccountRow>> {
    let query = match channel {
        Channel::Email => {
            r"
            SELECT id, email, phone, role, status,
                   email_verified_at IS NOT NULL AS email_verified,
                   phone_verified_at IS NOT NULL AS phone_verified
            FROM accounts
            WHERE email = $1
            "
        }
        Channel::Phone => {
            r"
            SELECT id, email, phone, role, status,
                   email_verified_at IS NOT NULL AS email_verified,
                   phone_verified_at IS NOT NULL AS phone_verified
            FROM accounts
            WHERE phone = $1
            "
        }
    };
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(contact)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to lookup account by contact")?;

    Ok(row.map(|row| AccountRow {
        id: row.get("id"),
        email: row.get("email"),
        phone: row.get("phone"),
        role: row.get("role"),
        status: row.get("status"),
        email_verified: row.get("email_verified"),
        phone_verified: row.get("phone_verified"),
    }))
}

/// Consume a pending challenge if the code matches and has not expired.
pub(super) async fn consume_passcode(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    channel: Channel,
    code: &str,
) -> Result<bool> {
    let code_hash = hash_passcode(code);
    let query = r"
        UPDATE passcode_challenges
        SET consumed_at = NOW()
        WHERE account_id = $1
          AND channel = $2
          AND code_hash = $3
          AND consumed_at IS NULL
          AND expires_at > NOW()
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .bind(channel.as_str())
        .bind(&code_hash)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to consume passcode challenge")?;

    Ok(row.is_some())
}

/// Record a channel as verified; returns the updated (email, phone) flags.
pub(super) async fn mark_channel_verified(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    channel: Channel,
) -> Result<(bool, bool)> {
    let query = match channel {
        Channel::Email => {
            r"
            UPDATE accounts
            SET email_verified_at = COALESCE(email_verified_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            RETURNING email_verified_at IS NOT NULL AS email_verified,
                      phone_verified_at IS NOT NULL AS phone_verified
            "
        }
        Channel::Phone => {
            r"
            UPDATE accounts
            SET phone_verified_at = COALESCE(phone_verified_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            RETURNING email_verified_at IS NOT NULL AS email_verified,
                      phone_verified_at IS NOT NULL AS phone_verified
            "
        }
    };
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await
        .context("failed to mark channel verified")?;

    Ok((row.get("email_verified"), row.get("phone_verified")))
}

/// Activate an account once both channels report verified.
pub(super) async fn activate_account(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET status = 'active',
            updated_at = NOW()
        WHERE id = $1
          AND email_verified_at IS NOT NULL
          AND phone_verified_at IS NOT NULL
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to activate account")?;
    Ok(())
}

/// Whether any challenge was ever issued for the channel (used to rebuild
/// progress state and to gate phone resends).
pub(super) async fn passcode_sent(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    channel: Channel,
) -> Result<bool> {
    let query = r"
        SELECT 1
        FROM passcode_challenges
        WHERE account_id = $1
          AND channel = $2
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .bind(channel.as_str())
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to check issued challenges")?;
    Ok(row.is_some())
}

/// Cooldown guard: true while a recent challenge exists for the channel.
pub(super) async fn passcode_cooldown_active(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    channel: Channel,
    cooldown_seconds: i64,
) -> Result<bool> {
    let query = r"
        SELECT 1
        FROM passcode_challenges
        WHERE account_id = $1
          AND channel = $2
          AND created_at > NOW() - ($3 * INTERVAL '1 second')
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .bind(channel.as_str())
        .bind(cooldown_seconds)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to check resend cooldown")?;
    Ok(row.is_some())
}

/// Open a session and return the raw bearer token.
pub(super) async fn insert_session(
    pool: &PgPool,
    account_id: Uuid,
    ttl_seconds: i64,
) -> Result<String> {
    // Generate a random token, store only its hash, and return the raw value
    // so the caller can hand it to the client.
    let query = r"
        INSERT INTO sessions (account_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Resolve a bearer token hash. Only active accounts and unexpired sessions match.
pub(crate) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT accounts.id, accounts.email, accounts.role
        FROM sessions
        JOIN accounts ON accounts.id = sessions.account_id
        WHERE sessions.token_hash = $1
          AND sessions.expires_at > NOW()
          AND accounts.status = 'active'
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    if row.is_none() {
        return Ok(None);
    }

    // Record activity for audit/visibility without extending the session TTL.
    let query = r"
        UPDATE sessions
        SET last_seen_at = NOW()
        WHERE token_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(row.map(|row| SessionRecord {
        account_id: row.get("id"),
        email: row.get("email"),
        role: row.get("role"),
    }))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM sessions WHERE token_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

/// Look up password-login data by email.
pub(super) async fn lookup_password_login(
    pool: &PgPool,
    email: &str,
) -> Result<Option<LoginRecord>> {
    let query = "SELECT id, status, password_hash, role FROM accounts WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login record")?;

    Ok(row.map(|row| LoginRecord {
        account_id: row.get("id"),
        status: row.get("status"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
    }))
}
