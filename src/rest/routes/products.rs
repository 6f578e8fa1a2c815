//! Catalog routes. Listing and detail are public; mutation is admin-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::{NewProduct, ProductFilter, ProductUpdate};
use crate::rest::auth::AdminUser;
use crate::rest::error::ApiError;
use crate::rest::response::{self, PageQuery};
use crate::validate::{FieldRules, Validator};
use crate::AppContext;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub size_id: Option<String>,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

pub async fn list_products(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<ProductListQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageQuery {
        page: q.page,
        limit: q.limit,
    };
    let (page_no, limit, offset) = page.resolve(10, ctx.config.limits.max_page_size);

    let filter = ProductFilter {
        search: q.search.filter(|s| !s.is_empty()),
        min_price_cents: q.min_price,
        max_price_cents: q.max_price,
        size_id: q.size_id.filter(|s| !s.is_empty()),
        color_id: q.color_id.filter(|s| !s.is_empty()),
        sort_by: q.sort_by,
        sort_order: q.sort_order,
        limit,
        offset,
    };

    let (products, total) = ctx.catalog.list_products(&filter).await?;
    Ok(response::ok(json!({
        "products": products,
        "pagination": response::pagination(total, page_no, limit),
    })))
}

pub async fn get_product(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let product = ctx
        .catalog
        .get_product(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    if !product.is_active {
        return Err(ApiError::NotFound("Product is not available".to_string()));
    }

    let design_type = match &product.design_type_id {
        Some(dt_id) => ctx.catalog.get_design_type(dt_id).await?,
        None => None,
    };
    let images = ctx.catalog.list_images(&product.id).await?;
    let bundle = ctx.catalog.bundle(product).await?;

    Ok(response::ok(json!({
        "product": bundle,
        "images": images,
        "design_type": design_type,
    })))
}

// ─── Admin: create / update ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub design_type_id: Option<String>,
    #[serde(default)]
    pub size_ids: Vec<String>,
    #[serde(default)]
    pub color_ids: Vec<String>,
}

pub async fn create_product(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.str_field(
        "name",
        body.name.as_deref(),
        &FieldRules {
            required: true,
            min_len: Some(3),
            max_len: Some(100),
            ..Default::default()
        },
    );
    v.str_field(
        "description",
        body.description.as_deref(),
        &FieldRules {
            required: true,
            min_len: Some(10),
            ..Default::default()
        },
    );
    v.int_field(
        "price_cents",
        body.price_cents,
        &FieldRules {
            required: true,
            min: Some(0),
            ..Default::default()
        },
    );
    if body.size_ids.is_empty() {
        v.str_field(
            "size_ids",
            None,
            &FieldRules {
                required: true,
                ..Default::default()
            },
        );
    }
    if body.color_ids.is_empty() {
        v.str_field(
            "color_ids",
            None,
            &FieldRules {
                required: true,
                ..Default::default()
            },
        );
    }
    v.finish().map_err(ApiError::Validation)?;

    for size_id in &body.size_ids {
        if !ctx.catalog.size_exists(size_id).await? {
            return Err(ApiError::BadRequest(
                "One or more sizes not found".to_string(),
            ));
        }
    }
    for color_id in &body.color_ids {
        if !ctx.catalog.color_exists(color_id).await? {
            return Err(ApiError::BadRequest(
                "One or more colors not found".to_string(),
            ));
        }
    }
    if let Some(ref dt_id) = body.design_type_id {
        if ctx.catalog.get_design_type(dt_id).await?.is_none() {
            return Err(ApiError::BadRequest("Design type not found".to_string()));
        }
    }

    let product = ctx
        .catalog
        .create_product(&NewProduct {
            name: body.name.unwrap_or_default(),
            description: body.description.unwrap_or_default(),
            price_cents: body.price_cents.unwrap_or_default(),
            design_type_id: body.design_type_id,
            size_ids: body.size_ids,
            color_ids: body.color_ids,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        response::ok(json!({ "product": product })),
    ))
}

pub async fn update_product(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(patch): Json<ProductUpdate>,
) -> Result<Json<Value>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let mut v = Validator::new();
    v.str_field(
        "name",
        patch.name.as_deref(),
        &FieldRules {
            min_len: Some(3),
            max_len: Some(100),
            ..Default::default()
        },
    );
    v.str_field(
        "description",
        patch.description.as_deref(),
        &FieldRules {
            min_len: Some(10),
            ..Default::default()
        },
    );
    v.int_field(
        "price_cents",
        patch.price_cents,
        &FieldRules {
            min: Some(0),
            ..Default::default()
        },
    );
    v.finish().map_err(ApiError::Validation)?;

    for size_id in patch.size_ids_to_add.iter() {
        if !ctx.catalog.size_exists(size_id).await? {
            return Err(ApiError::BadRequest(
                "One or more sizes not found".to_string(),
            ));
        }
    }
    for color_id in patch.color_ids_to_add.iter() {
        if !ctx.catalog.color_exists(color_id).await? {
            return Err(ApiError::BadRequest(
                "One or more colors not found".to_string(),
            ));
        }
    }
    if let Some(ref dt_id) = patch.design_type_id {
        if ctx.catalog.get_design_type(dt_id).await?.is_none() {
            return Err(ApiError::BadRequest("Design type not found".to_string()));
        }
    }

    let product = ctx
        .catalog
        .update_product(&id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let sizes = ctx.catalog.product_sizes(&id).await?;
    let colors = ctx.catalog.product_colors(&id).await?;
    Ok(response::ok(json!({
        "product": product,
        "sizes": sizes,
        "colors": colors,
    })))
}

// ─── Admin: images ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddImageRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_type: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

pub async fn add_image(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<AddImageRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let product = ctx
        .catalog
        .get_product(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let mut v = Validator::new();
    v.str_field(
        "url",
        body.url.as_deref(),
        &FieldRules {
            required: true,
            url: true,
            ..Default::default()
        },
    );
    v.finish().map_err(ApiError::Validation)?;

    let image_type = body.image_type.as_deref().unwrap_or("detail");
    if image_type != "primary" && image_type != "detail" {
        return Err(ApiError::BadRequest(
            "image_type must be \"primary\" or \"detail\"".to_string(),
        ));
    }
    let alt_text = body.alt_text.as_deref().unwrap_or(&product.name);

    let image = ctx
        .catalog
        .add_image(&id, &body.url.clone().unwrap_or_default(), image_type, alt_text)
        .await?;
    Ok((StatusCode::CREATED, response::ok(json!({ "image": image }))))
}

pub async fn delete_image(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    if !ctx.catalog.delete_image(&id, &image_id).await? {
        return Err(ApiError::NotFound("Image not found".to_string()));
    }
    Ok(response::ok(json!({ "deleted": image_id })))
}

// ─── Filter options ──────────────────────────────────────────────────────────

/// Everything a client needs to render catalog filters.
pub async fn catalog_options(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Value>, ApiError> {
    let sizes = ctx.catalog.list_sizes().await?;
    let colors = ctx.catalog.list_colors().await?;
    let design_types = ctx.catalog.list_design_types().await?;
    Ok(response::ok(json!({
        "sizes": sizes,
        "colors": colors,
        "design_types": design_types,
    })))
}
