//! Auth routes: register, login, logout, me, email verification, Google
//! OAuth.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::auth::model::{LoginRequest, RegisterRequest, UserPublic};
use crate::auth::{self, oauth};
use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::response;
use crate::validate::{FieldRules, Validator};
use crate::AppContext;

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.str_field(
        "name",
        body.name.as_deref(),
        &FieldRules {
            required: true,
            min_len: Some(2),
            max_len: Some(50),
            ..Default::default()
        },
    );
    v.str_field(
        "email",
        body.email.as_deref(),
        &FieldRules {
            required: true,
            email: true,
            ..Default::default()
        },
    );
    v.str_field(
        "password",
        body.password.as_deref(),
        &FieldRules {
            required: true,
            min_len: Some(8),
            ..Default::default()
        },
    );
    v.finish().map_err(ApiError::Validation)?;

    let (name, email, password) = (
        body.name.unwrap_or_default(),
        body.email.unwrap_or_default(),
        body.password.unwrap_or_default(),
    );

    if ctx.storage.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = auth::hash_password(&password)?;
    let user = ctx
        .storage
        .create_user(&email, &name, &password_hash, "local", false)
        .await?;
    ctx.metrics.inc_users_registered();

    Ok((
        StatusCode::CREATED,
        response::ok(json!({ "user": UserPublic::from(user) })),
    ))
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    v.str_field(
        "email",
        body.email.as_deref(),
        &FieldRules {
            required: true,
            email: true,
            ..Default::default()
        },
    );
    v.str_field(
        "password",
        body.password.as_deref(),
        &FieldRules {
            required: true,
            ..Default::default()
        },
    );
    v.finish().map_err(ApiError::Validation)?;

    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    // One message for both unknown-email and wrong-password — no account
    // enumeration through the login endpoint.
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = ctx
        .storage
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&password, &user.password_hash) {
        return Err(invalid());
    }

    let token = auth::issue_session(&ctx.storage, &user.id, ctx.config.session_ttl_days).await?;
    ctx.metrics.inc_logins();

    Ok(response::ok(json!({
        "user": UserPublic::from(user),
        "token": token,
    })))
}

pub async fn logout(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header missing or invalid".to_string())
        })?;

    if !auth::revoke_bearer(&ctx.storage, header_value).await? {
        return Err(ApiError::Unauthorized(
            "Invalid or expired token".to_string(),
        ));
    }
    Ok(response::ok(json!({ "message": "Logged out" })))
}

pub async fn me(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let addresses = ctx.storage.list_addresses(&user.id).await?;
    Ok(response::ok(json!({
        "user": UserPublic::from(user),
        "addresses": addresses,
    })))
}

// ─── Email verification ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn request_verification(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = body
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    auth::request_email_verification(&ctx.storage, &ctx.config, &email).await?;

    Ok(response::ok(json!({
        "message": "If your email is registered, you will receive a verification link shortly"
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// The link target from the verification mail. Always redirects back to the
/// frontend, carrying the outcome in the query string.
pub async fn confirm_verification(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<VerifyTokenQuery>,
) -> Redirect {
    let base = &ctx.config.public_url;
    let Some(token) = q.token.filter(|t| !t.is_empty()) else {
        return Redirect::to(&format!("{base}/auth?error=invalid_verification_link"));
    };

    match auth::confirm_email_token(&ctx.storage, &token).await {
        Ok(true) => Redirect::to(&format!("{base}/auth?email_verified=true")),
        Ok(false) => Redirect::to(&format!("{base}/auth?error=invalid_verification_token")),
        Err(e) => {
            warn!("email verification failed: {e:#}");
            Redirect::to(&format!("{base}/auth?error=verification_failed"))
        }
    }
}

// ─── Google OAuth ────────────────────────────────────────────────────────────

pub async fn google_start(State(ctx): State<Arc<AppContext>>) -> Result<Redirect, ApiError> {
    let Some(client_id) = ctx.config.oauth.google_client_id.clone() else {
        return Err(ApiError::Unavailable(
            "Google auth is not configured".to_string(),
        ));
    };

    let state = auth::new_token();
    ctx.storage
        .insert_oauth_state(&state, auth::OAUTH_STATE_TTL_SECS)
        .await?;
    let url = oauth::consent_url(&ctx.config, &client_id, &state)?;
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Google redirects here after consent. Every failure mode lands back on the
/// frontend auth page with an error code; success carries the session token
/// in the URL fragment so it never hits server logs along the way.
pub async fn google_callback(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<GoogleCallbackQuery>,
) -> Redirect {
    let base = ctx.config.public_url.clone();
    match callback_inner(&ctx, q).await {
        Ok(token) => Redirect::to(&format!("{base}/auth/callback#token={token}")),
        Err(code) => Redirect::to(&format!("{base}/auth?error={code}")),
    }
}

async fn callback_inner(
    ctx: &Arc<AppContext>,
    q: GoogleCallbackQuery,
) -> Result<String, &'static str> {
    if let Some(error) = q.error {
        warn!(%error, "Google OAuth denied");
        return Err("google_auth_failed");
    }
    let code = q.code.filter(|c| !c.is_empty()).ok_or("google_auth_failed")?;
    let state = q.state.filter(|s| !s.is_empty()).ok_or("invalid_state")?;

    match ctx.storage.consume_oauth_state(&state).await {
        Ok(true) => {}
        Ok(false) => return Err("invalid_state"),
        Err(e) => {
            warn!("oauth state lookup failed: {e:#}");
            return Err("server_error");
        }
    }

    let access_token = oauth::exchange_code(&ctx.http, &ctx.config, &code)
        .await
        .map_err(|e| {
            warn!("failed to exchange code for token: {e:#}");
            "token_exchange_failed"
        })?;
    let profile = oauth::fetch_userinfo(&ctx.http, &ctx.config, &access_token)
        .await
        .map_err(|e| {
            warn!("failed to get user info: {e:#}");
            "user_info_failed"
        })?;

    let user = oauth::login_or_create(&ctx.storage, &profile)
        .await
        .map_err(|e| {
            warn!("google sign-in failed: {e:#}");
            "server_error"
        })?;
    let token = auth::issue_session(&ctx.storage, &user.id, ctx.config.session_ttl_days)
        .await
        .map_err(|e| {
            warn!("session issue failed: {e:#}");
            "server_error"
        })?;
    ctx.metrics.inc_logins();
    Ok(token)
}
