//! Admin routes: dashboard summary, user list, order fulfilment, inventory.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::auth::model::UserPublic;
use crate::orders::{OrderStatus, PaymentStatus};
use crate::rest::auth::AdminUser;
use crate::rest::error::ApiError;
use crate::rest::response::{self, PageQuery};
use crate::AppContext;

const LOW_STOCK_THRESHOLD: i64 = 5;

/// One-call dashboard payload: counts, revenue, recent orders, low stock.
pub async fn summary(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Value>, ApiError> {
    let users = ctx.storage.count_users().await?;
    let active_products = ctx.catalog.count_active_products().await?;
    let orders_total = ctx.orders.count_orders().await?;
    let by_status = ctx.orders.count_orders_by_status().await?;
    let revenue_cents = ctx.orders.revenue_cents().await?;
    let recent = ctx.orders.recent_orders(10).await?;
    let low_stock = ctx.catalog.low_stock(LOW_STOCK_THRESHOLD, 20).await?;

    let mut orders_by_status = Map::new();
    for (status, count) in by_status {
        orders_by_status.insert(status, json!(count));
    }

    Ok(response::ok(json!({
        "users": users,
        "active_products": active_products,
        "orders": { "total": orders_total, "by_status": orders_by_status },
        "revenue_cents": revenue_cents,
        "recent_orders": recent,
        "low_stock": low_stock,
    })))
}

pub async fn list_users(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page_no, limit, offset) = page.resolve(20, ctx.config.limits.max_page_size);
    let users = ctx.storage.list_users(limit, offset).await?;
    let total = ctx.storage.count_users().await?;
    let users: Vec<UserPublic> = users.into_iter().map(UserPublic::from).collect();
    Ok(response::ok(json!({
        "users": users,
        "pagination": response::pagination(total, page_no, limit),
    })))
}

// ─── Orders ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list_orders(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<AdminOrderListQuery>,
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
    let (page_no, limit, offset) = page.resolve(20, ctx.config.limits.max_page_size);
    let (orders, total) = ctx
        .orders
        .list_all_orders(status.as_deref(), limit, offset)
        .await?;

    Ok(response::ok(json!({
        "orders": orders,
        "pagination": response::pagination(total, page_no, limit),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AdminOrderUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

pub async fn update_order(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<AdminOrderUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let status = match body.status.as_deref() {
        Some(s) => Some(
            OrderStatus::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {s}")))?,
        ),
        None => None,
    };
    let payment_status = match body.payment_status.as_deref() {
        Some(s) => Some(
            PaymentStatus::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid payment status: {s}")))?,
        ),
        None => None,
    };
    if status.is_none() && payment_status.is_none() && body.tracking_number.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let before = ctx
        .orders
        .get_order(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    let order = ctx
        .orders
        .admin_update_order(&id, status, payment_status, body.tracking_number.as_deref())
        .await?;

    if status == Some(OrderStatus::Cancelled) && before.status != OrderStatus::Cancelled.as_str() {
        ctx.metrics.inc_orders_cancelled();
    }

    Ok(response::ok(json!({ "order": order })))
}

// ─── Inventory ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetInventoryRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub size_id: Option<String>,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Set the absolute stock of one (product, size, color) cell.
pub async fn set_inventory(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<SetInventoryRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(product_id), Some(size_id), Some(color_id), Some(quantity)) = (
        body.product_id.filter(|s| !s.is_empty()),
        body.size_id.filter(|s| !s.is_empty()),
        body.color_id.filter(|s| !s.is_empty()),
        body.quantity,
    ) else {
        return Err(ApiError::BadRequest(
            "product_id, size_id, color_id and quantity are required".to_string(),
        ));
    };
    if quantity < 0 {
        return Err(ApiError::BadRequest(
            "quantity must be at least 0".to_string(),
        ));
    }

    if ctx.catalog.get_product(&product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }
    if !ctx.catalog.size_exists(&size_id).await? {
        return Err(ApiError::BadRequest("Size not found".to_string()));
    }
    if !ctx.catalog.color_exists(&color_id).await? {
        return Err(ApiError::BadRequest("Color not found".to_string()));
    }

    ctx.catalog
        .set_inventory(&product_id, &size_id, &color_id, quantity)
        .await?;
    let inventory = ctx.catalog.inventory_for_product(&product_id).await?;
    Ok(response::ok(json!({ "inventory": inventory })))
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    #[serde(default)]
    pub threshold: Option<i64>,
}

pub async fn low_stock(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<LowStockQuery>,
) -> Result<Json<Value>, ApiError> {
    let threshold = q.threshold.unwrap_or(LOW_STOCK_THRESHOLD).max(0);
    let cells = ctx.catalog.low_stock(threshold, 100).await?;
    Ok(response::ok(json!({
        "threshold": threshold,
        "cells": cells,
    })))
}
