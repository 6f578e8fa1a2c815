//! Auth data model types.

use serde::{Deserialize, Serialize};

use crate::storage::UserRow;

/// Public view of a user — safe to send to any client.
///
/// Identical to [`UserRow`] but with `password_hash` stripped.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub auth_provider: String,
    pub email_verified: bool,
    pub created_at: String,
}

impl From<UserRow> for UserPublic {
    fn from(u: UserRow) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            is_admin: u.is_admin,
            auth_provider: u.auth_provider,
            email_verified: u.email_verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login payload. The token is the caller's only copy — the
/// server stores a digest.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserPublic,
    /// 32-char hex bearer token.
    pub token: String,
}
