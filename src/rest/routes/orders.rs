//! Order routes for the storefront user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::orders::{OrderRow, OrderStatus, PlaceOrderRequest};
use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::response::{self, PageQuery};
use crate::AppContext;

pub async fn create_order(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let address_id = body
        .address_id
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::BadRequest("address_id is required".to_string()))?;

    let (order, items) = ctx
        .orders
        .place_order(
            &user.id,
            &address_id,
            &body.items,
            ctx.config.limits.max_order_items,
        )
        .await?;
    ctx.metrics.inc_orders_placed();

    Ok((
        StatusCode::CREATED,
        response::ok(json!({ "order": order, "items": items })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Render one order with its items for a list/detail response.
async fn order_json(ctx: &AppContext, order: &OrderRow) -> Result<Value, ApiError> {
    let items = ctx.orders.items_detail(&order.id).await?;
    let address = ctx.storage.get_address(&order.address_id).await?;
    Ok(json!({
        "order": order,
        "items": items,
        "shipping_address": address,
    }))
}

pub async fn list_orders(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Query(q): Query<OrderListQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = match q.status.filter(|s| !s.is_empty()) {
        Some(s) => match OrderStatus::parse(&s) {
            Some(_) => Some(s),
            None => return Err(ApiError::BadRequest("Invalid status filter".to_string())),
        },
        None => None,
    };

    let page = PageQuery {
        page: q.page,
        limit: q.limit,
    };
    let (page_no, limit, offset) = page.resolve(10, ctx.config.limits.max_page_size);

    let (orders, total) = ctx
        .orders
        .list_user_orders(&user.id, status.as_deref(), limit, offset)
        .await?;

    let mut rendered = Vec::with_capacity(orders.len());
    for order in &orders {
        rendered.push(order_json(&ctx, order).await?);
    }

    Ok(response::ok(json!({
        "orders": rendered,
        "pagination": response::pagination(total, page_no, limit),
    })))
}

pub async fn get_order(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let order = ctx
        .orders
        .get_user_order(&id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
    Ok(response::ok(order_json(&ctx, &order).await?))
}

#[derive(Debug, Deserialize)]
pub struct OrderActionRequest {
    #[serde(default)]
    pub action: Option<String>,
}

/// The only user-driven transition: `{ "action": "cancel" }` on a PENDING
/// order. Cancellation restores the stock the order held.
pub async fn update_order(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<OrderActionRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.action.as_deref() != Some("cancel") {
        return Err(ApiError::BadRequest("Invalid action".to_string()));
    }

    let order = ctx.orders.cancel_order(&id, &user.id).await?;
    ctx.metrics.inc_orders_cancelled();
    Ok(response::ok(json!({ "order": order })))
}
