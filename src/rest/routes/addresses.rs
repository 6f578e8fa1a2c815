//! Shipping address routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::response;
use crate::validate::{FieldRules, Validator};
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn create_address(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    let required = FieldRules {
        required: true,
        ..Default::default()
    };
    v.str_field("street", body.street.as_deref(), &required);
    v.str_field("city", body.city.as_deref(), &required);
    v.str_field("state", body.state.as_deref(), &required);
    v.str_field("postal_code", body.postal_code.as_deref(), &required);
    v.str_field("country", body.country.as_deref(), &required);
    v.finish().map_err(ApiError::Validation)?;

    let address = ctx
        .storage
        .create_address(
            &user.id,
            &body.street.unwrap_or_default(),
            &body.city.unwrap_or_default(),
            &body.state.unwrap_or_default(),
            &body.postal_code.unwrap_or_default(),
            &body.country.unwrap_or_default(),
            body.phone.as_deref(),
            body.is_default,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        response::ok(json!({ "address": address })),
    ))
}

pub async fn list_addresses(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let addresses = ctx.storage.list_addresses(&user.id).await?;
    Ok(response::ok(json!({ "addresses": addresses })))
}

pub async fn delete_address(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match ctx.storage.delete_address(&id, &user.id).await {
        Ok(true) => Ok(response::ok(json!({ "deleted": id }))),
        Ok(false) => Err(ApiError::NotFound("Address not found".to_string())),
        // Orders keep a foreign key to their shipping address.
        Err(e) if e.to_string().contains("FOREIGN KEY") => Err(ApiError::Conflict(
            "Address is referenced by existing orders".to_string(),
        )),
        Err(e) => Err(ApiError::Internal(e)),
    }
}
