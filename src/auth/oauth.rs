//! Google OAuth sign-in.
//!
//! The server drives the standard authorization-code flow: redirect to the
//! consent screen with a persisted one-time `state`, exchange the returned
//! code for an access token, fetch the Google profile, and find-or-create a
//! local account for it. Google-vouched accounts start email-verified.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use tracing::info;

use crate::config::StoreConfig;
use crate::storage::{Storage, UserRow};

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Build the Google consent URL for a previously persisted `state`.
pub fn consent_url(config: &StoreConfig, client_id: &str, state: &str) -> Result<String> {
    let url = reqwest::Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("scope", "email profile"),
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", config.oauth_redirect_uri().as_str()),
            ("state", state),
            ("prompt", "select_account"),
        ],
    )
    .context("invalid Google consent URL")?;
    Ok(url.to_string())
}

/// Exchange an authorization code for a Google access token.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &StoreConfig,
    code: &str,
) -> Result<String> {
    let client_id = config
        .oauth
        .google_client_id
        .as_deref()
        .context("Google auth is not configured")?;
    let client_secret = config
        .oauth
        .google_client_secret
        .as_deref()
        .context("Google auth is not configured")?;

    let token: GoogleTokenResponse = http
        .post(&config.oauth.token_url)
        .form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", config.oauth_redirect_uri().as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .context("token exchange request failed")?
        .error_for_status()
        .context("token exchange rejected")?
        .json()
        .await
        .context("malformed token response")?;

    Ok(token.access_token)
}

/// Fetch the Google profile for an access token.
pub async fn fetch_userinfo(
    http: &reqwest::Client,
    config: &StoreConfig,
    access_token: &str,
) -> Result<GoogleUserInfo> {
    let userinfo: GoogleUserInfo = http
        .get(&config.oauth.userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .context("userinfo request failed")?
        .error_for_status()
        .context("userinfo rejected")?
        .json()
        .await
        .context("malformed userinfo response")?;
    Ok(userinfo)
}

/// Find the local account for a Google profile, creating one on first login.
///
/// New accounts get a random unusable password (hashed, never disclosed) so
/// the password-login path stays closed until the user sets one.
pub async fn login_or_create(storage: &Storage, profile: &GoogleUserInfo) -> Result<UserRow> {
    if let Some(user) = storage.get_user_by_email(&profile.email).await? {
        return Ok(user);
    }

    let name = if profile.name.is_empty() {
        profile.email.clone()
    } else {
        profile.name.clone()
    };
    let random_password = super::new_token();
    let password_hash = super::hash_password(&random_password)?;
    let user = storage
        .create_user(&profile.email, &name, &password_hash, "google", true)
        .await?;
    info!(email = %user.email, "created account via Google sign-in");
    Ok(user)
}
