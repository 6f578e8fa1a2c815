//! SQLite persistence layer.
//!
//! `Storage` owns the connection pool and the account-shaped tables (users,
//! addresses, sessions, one-time tokens). Catalog, order, and design queries
//! live in their own sub-storages over the same pool — see
//! `catalog::storage`, `orders::storage`, `designs::storage`.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the server indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
/// Returns an error if the operation takes longer than `QUERY_TIMEOUT`.
pub(crate) async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

/// Current time as RFC 3339 — the format of every entity timestamp column.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Current unix time in seconds — the format of token/session expiries.
pub(crate) fn now_ts() -> i64 {
    Utc::now().timestamp()
}

// ─── Row types ────────────────────────────────────────────────────────────────

/// Full user record, password hash included.
///
/// **Never send this struct to a client over the wire.** Use
/// [`crate::auth::model::UserPublic`] for all outbound JSON — it omits the
/// hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    /// Stored lowercase; lookups lowercase their input.
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_admin: bool,
    /// "local" | "google"
    pub auth_provider: String,
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct AddressRow {
    pub id: String,
    pub user_id: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: String,
}

/// A bearer session. `token_digest` is the SHA-256 of the plaintext token —
/// the plaintext is returned once at login and never stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub token_digest: String,
    pub user_id: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub revoked: bool,
    pub last_seen_at: Option<i64>,
}

// ─── Storage ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("stitchd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create the catalog/order/design sub-storages that share the
    /// same SQLite connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        auth_provider: &str,
        email_verified: bool,
    ) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let email = email.to_lowercase();
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, is_admin, auth_provider, email_verified, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(name)
        .bind(password_hash)
        .bind(auth_provider)
        .bind(email_verified)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after insert"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?")
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn count_users(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn mark_email_verified(&self, user_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET email_verified = 1, updated_at = ? WHERE id = ?")
            .bind(now_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Grant or revoke the admin flag. Returns `false` when no such user exists.
    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_admin = ?, updated_at = ? WHERE email = ?")
            .bind(is_admin)
            .bind(now_rfc3339())
            .bind(email.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Sessions ───────────────────────────────────────────────────────────

    pub async fn insert_session(
        &self,
        token_digest: &str,
        user_id: &str,
        ttl_secs: i64,
    ) -> Result<()> {
        let now = now_ts();
        sqlx::query(
            "INSERT INTO sessions (token_digest, user_id, created_at, expires_at, revoked)
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(token_digest)
        .bind(user_id)
        .bind(now)
        .bind(now + ttl_secs)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a live (non-revoked, non-expired) session by token digest.
    pub async fn get_live_session(&self, token_digest: &str) -> Result<Option<SessionRow>> {
        Ok(sqlx::query_as(
            "SELECT * FROM sessions WHERE token_digest = ? AND revoked = 0 AND expires_at > ?",
        )
        .bind(token_digest)
        .bind(now_ts())
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn touch_session(&self, token_digest: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET last_seen_at = ? WHERE token_digest = ?")
            .bind(now_ts())
            .bind(token_digest)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn revoke_session(&self, token_digest: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET revoked = 1 WHERE token_digest = ?")
            .bind(token_digest)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete expired sessions and stale one-time tokens. Run at startup.
    pub async fn prune_expired(&self) -> Result<u64> {
        let now = now_ts();
        let mut pruned = 0;
        for stmt in [
            "DELETE FROM sessions WHERE expires_at <= ?",
            "DELETE FROM email_tokens WHERE expires_at <= ?",
            "DELETE FROM oauth_states WHERE expires_at <= ?",
        ] {
            pruned += sqlx::query(stmt).bind(now).execute(&self.pool).await?.rows_affected();
        }
        Ok(pruned)
    }

    // ─── Email verification tokens ──────────────────────────────────────────

    pub async fn insert_email_token(
        &self,
        token_digest: &str,
        user_id: &str,
        ttl_secs: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO email_tokens (token_digest, user_id, expires_at, used) VALUES (?, ?, ?, 0)",
        )
        .bind(token_digest)
        .bind(user_id)
        .bind(now_ts() + ttl_secs)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Atomically consume a verification token. The guarded UPDATE makes the
    /// token one-shot: a second call sees zero affected rows and gets `None`.
    pub async fn consume_email_token(&self, token_digest: &str) -> Result<Option<String>> {
        let result = sqlx::query(
            "UPDATE email_tokens SET used = 1 WHERE token_digest = ? AND used = 0 AND expires_at > ?",
        )
        .bind(token_digest)
        .bind(now_ts())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let row: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM email_tokens WHERE token_digest = ?")
                .bind(token_digest)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(user_id,)| user_id))
    }

    // ─── OAuth state nonces ─────────────────────────────────────────────────

    pub async fn insert_oauth_state(&self, state: &str, ttl_secs: i64) -> Result<()> {
        let now = now_ts();
        sqlx::query(
            "INSERT INTO oauth_states (state, created_at, expires_at, used) VALUES (?, ?, ?, 0)",
        )
        .bind(state)
        .bind(now)
        .bind(now + ttl_secs)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consume an OAuth state nonce. Same one-shot guard as email tokens.
    pub async fn consume_oauth_state(&self, state: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE oauth_states SET used = 1 WHERE state = ? AND used = 0 AND expires_at > ?",
        )
        .bind(state)
        .bind(now_ts())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Addresses ──────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub async fn create_address(
        &self,
        user_id: &str,
        street: &str,
        city: &str,
        state: &str,
        postal_code: &str,
        country: &str,
        phone: Option<&str>,
        is_default: bool,
    ) -> Result<AddressRow> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;
        if is_default {
            sqlx::query("UPDATE addresses SET is_default = 0 WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            "INSERT INTO addresses (id, user_id, street, city, state, postal_code, country, phone, is_default, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(street)
        .bind(city)
        .bind(state)
        .bind(postal_code)
        .bind(country)
        .bind(phone)
        .bind(is_default)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get_address(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("address not found after insert"))
    }

    pub async fn get_address(&self, id: &str) -> Result<Option<AddressRow>> {
        Ok(sqlx::query_as("SELECT * FROM addresses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Fetch an address only if it belongs to `user_id` — the ownership check
    /// order placement relies on.
    pub async fn get_user_address(&self, id: &str, user_id: &str) -> Result<Option<AddressRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM addresses WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn list_addresses(&self, user_id: &str) -> Result<Vec<AddressRow>> {
        Ok(sqlx::query_as(
            "SELECT * FROM addresses WHERE user_id = ? ORDER BY is_default DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn delete_address(&self, id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
