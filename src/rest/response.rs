//! Success envelope and pagination helpers.

use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

/// `{ "success": true, "data": ... }`
pub fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Common `?page=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolve to (page, limit, offset) with a per-endpoint default and the
    /// configured hard cap.
    pub fn resolve(&self, default_limit: i64, max_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        (page, limit, (page - 1) * limit)
    }
}

/// The pagination block every list response embeds.
pub fn pagination(total_items: i64, page: i64, limit: i64) -> Value {
    let total_pages = if total_items == 0 {
        0
    } else {
        (total_items + limit - 1) / limit
    };
    json!({
        "total_items": total_items,
        "total_pages": total_pages,
        "current_page": page,
        "items_per_page": limit,
    })
}
