//! Request authentication extractors.
//!
//! Handlers that need a caller take `AuthUser` (any live session) or
//! `AdminUser` (live session + admin flag) as an argument — the extractor
//! rejects the request before the handler body runs.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use std::sync::Arc;

use crate::auth;
use crate::storage::UserRow;
use crate::AppContext;

use super::error::ApiError;

/// The authenticated caller.
pub struct AuthUser(pub UserRow);

/// The authenticated caller, verified to be an admin.
pub struct AdminUser(pub UserRow);

async fn authenticate(parts: &mut Parts, ctx: &Arc<AppContext>) -> Result<UserRow, ApiError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header missing or invalid".to_string())
        })?;

    match auth::authenticate_bearer(&ctx.storage, header_value).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::Unauthorized(
            "Invalid or expired token".to_string(),
        )),
        Err(e) => Err(ApiError::Internal(e)),
    }
}

impl FromRequestParts<Arc<AppContext>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, ctx).await.map(AuthUser)
    }
}

impl FromRequestParts<Arc<AppContext>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, ctx).await?;
        if !user.is_admin {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
