//! Design routes: save and browse AI-generated designs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::response::{self, PageQuery};
use crate::validate::{FieldRules, Validator};
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct CreateDesignRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

pub async fn create_design(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateDesignRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.str_field(
        "prompt",
        body.prompt.as_deref(),
        &FieldRules {
            required: true,
            max_len: Some(1000),
            ..Default::default()
        },
    );
    v.str_field(
        "image_url",
        body.image_url.as_deref(),
        &FieldRules {
            required: true,
            url: true,
            ..Default::default()
        },
    );
    v.finish().map_err(ApiError::Validation)?;

    let design = ctx
        .designs
        .create_design(
            &user.id,
            &body.prompt.unwrap_or_default(),
            &body.image_url.unwrap_or_default(),
            body.is_public,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        response::ok(json!({ "design": design })),
    ))
}

pub async fn list_designs(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page_no, limit, offset) = page.resolve(20, ctx.config.limits.max_page_size);
    let (designs, total) = ctx.designs.list_user_designs(&user.id, limit, offset).await?;
    Ok(response::ok(json!({
        "designs": designs,
        "pagination": response::pagination(total, page_no, limit),
    })))
}

/// Public gallery — no authentication.
pub async fn public_designs(
    State(ctx): State<Arc<AppContext>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page_no, limit, offset) = page.resolve(20, ctx.config.limits.max_page_size);
    let (designs, total) = ctx.designs.list_public_designs(limit, offset).await?;
    Ok(response::ok(json!({
        "designs": designs,
        "pagination": response::pagination(total, page_no, limit),
    })))
}

pub async fn delete_design(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !ctx.designs.delete_design(&id, &user.id).await? {
        return Err(ApiError::NotFound("Design not found".to_string()));
    }
    Ok(response::ok(json!({ "deleted": id })))
}
