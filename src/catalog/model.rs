//! Catalog data model types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SizeRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ColorRow {
    pub id: String,
    pub name: String,
    pub hex_code: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct DesignTypeRow {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub design_type_id: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProductImageRow {
    pub id: String,
    pub product_id: String,
    pub url: String,
    /// "primary" | "detail" — at most one primary per product.
    pub image_type: String,
    pub alt_text: String,
    pub created_at: String,
}

/// One stock cell with its display names joined in.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct InventoryCellRow {
    pub product_id: String,
    pub size_id: String,
    pub color_id: String,
    pub quantity: i64,
    pub size_name: String,
    pub color_name: String,
    pub hex_code: String,
}

/// A low-stock cell for the admin dashboard.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LowStockRow {
    pub product_id: String,
    pub product_name: String,
    pub size_name: String,
    pub color_name: String,
    pub quantity: i64,
}

/// Listing filters. All fields optional; unset means "don't filter".
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub size_id: Option<String>,
    pub color_id: Option<String>,
    /// Whitelisted in the query builder; anything else falls back to created_at.
    pub sort_by: Option<String>,
    /// "asc" | "desc" (default desc).
    pub sort_order: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub design_type_id: Option<String>,
    pub size_ids: Vec<String>,
    pub color_ids: Vec<String>,
}

/// Partial product update. `None` fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub design_type_id: Option<String>,
    #[serde(default)]
    pub size_ids_to_add: Vec<String>,
    #[serde(default)]
    pub size_ids_to_remove: Vec<String>,
    #[serde(default)]
    pub color_ids_to_add: Vec<String>,
    #[serde(default)]
    pub color_ids_to_remove: Vec<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.is_active.is_none()
            && self.design_type_id.is_none()
            && self.size_ids_to_add.is_empty()
            && self.size_ids_to_remove.is_empty()
            && self.color_ids_to_add.is_empty()
            && self.color_ids_to_remove.is_empty()
    }
}

/// A product with everything a listing or detail response embeds.
#[derive(Debug, Serialize)]
pub struct ProductBundle {
    #[serde(flatten)]
    pub product: ProductRow,
    pub primary_image: Option<ProductImageRow>,
    pub sizes: Vec<SizeRow>,
    pub colors: Vec<ColorRow>,
    pub inventory: Vec<InventoryCellRow>,
}
