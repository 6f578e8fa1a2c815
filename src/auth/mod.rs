//! Accounts and sessions.
//!
//! Passwords are hashed with Argon2id. Sessions are opaque 32-char hex
//! bearer tokens; only their SHA-256 digest is stored, so a database leak
//! never yields a usable credential. Email verification uses one-time
//! tokens consumed by a guarded UPDATE.

pub mod model;
pub mod oauth;

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::storage::{Storage, UserRow};

/// Lifetime of an email verification token.
pub const EMAIL_TOKEN_TTL_SECS: i64 = 30 * 60;
/// Lifetime of an OAuth state nonce.
pub const OAUTH_STATE_TTL_SECS: i64 = 10 * 60;

// ─── Passwords ────────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// Generate a new opaque token (UUID v4, hex without dashes = 32 chars).
pub fn new_token() -> String {
    Uuid::new_v4().to_string().replace('-', "")
}

/// SHA-256 hex digest — the only form of a token that touches the database.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Extract the token from a `Bearer <token>` authorization string.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

/// Issue a new session for `user_id` and return the plaintext token.
pub async fn issue_session(storage: &Storage, user_id: &str, ttl_days: u32) -> Result<String> {
    let token = new_token();
    let ttl_secs = i64::from(ttl_days) * 86_400;
    storage
        .insert_session(&token_digest(&token), user_id, ttl_secs)
        .await?;
    Ok(token)
}

/// Resolve an `Authorization` header value to its user.
///
/// Returns `None` for a missing/malformed header, an unknown token, or a
/// revoked/expired session. Touches `last_seen_at` on success.
pub async fn authenticate_bearer(
    storage: &Storage,
    header_value: &str,
) -> Result<Option<UserRow>> {
    let Some(token) = bearer_token(header_value) else {
        return Ok(None);
    };
    let digest = token_digest(token);
    let Some(session) = storage.get_live_session(&digest).await? else {
        return Ok(None);
    };
    storage.touch_session(&digest).await?;
    storage.get_user(&session.user_id).await
}

/// Revoke the session presented in an `Authorization` header.
pub async fn revoke_bearer(storage: &Storage, header_value: &str) -> Result<bool> {
    let Some(token) = bearer_token(header_value) else {
        return Ok(false);
    };
    storage.revoke_session(&token_digest(token)).await
}

// ─── Email verification ───────────────────────────────────────────────────────

/// Mint a one-time verification token for `email` and "send" it.
///
/// Outbound mail is out of scope — the link is logged at INFO, which is also
/// what the test suite reads. Unknown emails are silently accepted so the
/// endpoint cannot be used to enumerate accounts.
pub async fn request_email_verification(
    storage: &Storage,
    config: &StoreConfig,
    email: &str,
) -> Result<()> {
    let Some(user) = storage.get_user_by_email(email).await? else {
        return Ok(());
    };
    let token = new_token();
    storage
        .insert_email_token(&token_digest(&token), &user.id, EMAIL_TOKEN_TTL_SECS)
        .await?;
    let link = format!(
        "{}/api/auth/verify-email?token={token}",
        config.public_url
    );
    info!(email = %user.email, %link, "verification email queued");
    Ok(())
}

/// Consume a verification token and mark its user verified.
/// Returns `false` for unknown, expired, or already-used tokens.
pub async fn confirm_email_token(storage: &Storage, token: &str) -> Result<bool> {
    match storage.consume_email_token(&token_digest(token)).await? {
        Some(user_id) => {
            storage.mark_email_verified(&user_id).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_32_hex_chars() {
        let t = new_token();
        assert_eq!(t.len(), 32);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_is_stable_and_distinct_from_token() {
        let t = new_token();
        assert_eq!(token_digest(&t), token_digest(&t));
        assert_ne!(token_digest(&t), t);
        assert_eq!(token_digest(&t).len(), 64);
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("hunter2hunter2", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }
}
