//! Catalog queries over the shared SQLite pool.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::storage::{now_rfc3339, with_timeout};

use super::model::{
    ColorRow, DesignTypeRow, InventoryCellRow, LowStockRow, NewProduct, ProductBundle,
    ProductFilter, ProductImageRow, ProductRow, ProductUpdate, SizeRow,
};

/// Owned bind argument for the hand-assembled filter query.
enum BindArg {
    Text(String),
    Int(i64),
}

#[derive(Clone)]
pub struct CatalogStorage {
    pool: SqlitePool,
}

impl CatalogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Sizes / colors / design types ──────────────────────────────────────

    pub async fn list_sizes(&self) -> Result<Vec<SizeRow>> {
        Ok(sqlx::query_as("SELECT * FROM sizes ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_colors(&self) -> Result<Vec<ColorRow>> {
        Ok(sqlx::query_as("SELECT * FROM colors ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_design_types(&self) -> Result<Vec<DesignTypeRow>> {
        Ok(sqlx::query_as("SELECT * FROM design_types ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_design_type(&self, id: &str) -> Result<Option<DesignTypeRow>> {
        Ok(sqlx::query_as("SELECT * FROM design_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create_size(&self, name: &str) -> Result<SizeRow> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sizes (id, name) VALUES (?, ?)")
            .bind(&id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(SizeRow {
            id,
            name: name.to_string(),
        })
    }

    pub async fn create_color(
        &self,
        name: &str,
        hex_code: &str,
        image_url: Option<&str>,
    ) -> Result<ColorRow> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO colors (id, name, hex_code, image_url) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(hex_code)
            .bind(image_url)
            .execute(&self.pool)
            .await?;
        Ok(ColorRow {
            id,
            name: name.to_string(),
            hex_code: hex_code.to_string(),
            image_url: image_url.map(String::from),
        })
    }

    pub async fn create_design_type(&self, name: &str, description: &str) -> Result<DesignTypeRow> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO design_types (id, name, description) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(DesignTypeRow {
            id,
            name: name.to_string(),
            description: description.to_string(),
        })
    }

    pub async fn size_exists(&self, id: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sizes WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    pub async fn color_exists(&self, id: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM colors WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    // ─── Products ───────────────────────────────────────────────────────────

    pub async fn get_product(&self, id: &str) -> Result<Option<ProductRow>> {
        Ok(sqlx::query_as("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Create a product with its size/color associations and a zero-quantity
    /// inventory cell for every (size, color) combination, atomically.
    pub async fn create_product(&self, new: &NewProduct) -> Result<ProductRow> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO products (id, name, description, price_cents, design_type_id, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(&new.design_type_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for size_id in &new.size_ids {
            sqlx::query("INSERT OR IGNORE INTO product_sizes (product_id, size_id) VALUES (?, ?)")
                .bind(&id)
                .bind(size_id)
                .execute(&mut *tx)
                .await?;
        }
        for color_id in &new.color_ids {
            sqlx::query("INSERT OR IGNORE INTO product_colors (product_id, color_id) VALUES (?, ?)")
                .bind(&id)
                .bind(color_id)
                .execute(&mut *tx)
                .await?;
        }
        Self::regenerate_inventory_grid(&mut tx, &id).await?;
        tx.commit().await?;

        self.get_product(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("product not found after insert"))
    }

    /// Apply a partial update. Returns `None` when the product does not exist.
    pub async fn update_product(
        &self,
        id: &str,
        patch: &ProductUpdate,
    ) -> Result<Option<ProductRow>> {
        if self.get_product(id).await?.is_none() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        let mut sets: Vec<&str> = Vec::new();
        if patch.name.is_some() {
            sets.push("name = ?");
        }
        if patch.description.is_some() {
            sets.push("description = ?");
        }
        if patch.price_cents.is_some() {
            sets.push("price_cents = ?");
        }
        if patch.is_active.is_some() {
            sets.push("is_active = ?");
        }
        if patch.design_type_id.is_some() {
            sets.push("design_type_id = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE products SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);
        if let Some(ref name) = patch.name {
            q = q.bind(name);
        }
        if let Some(ref description) = patch.description {
            q = q.bind(description);
        }
        if let Some(price_cents) = patch.price_cents {
            q = q.bind(price_cents);
        }
        if let Some(is_active) = patch.is_active {
            q = q.bind(is_active);
        }
        if let Some(ref design_type_id) = patch.design_type_id {
            q = q.bind(design_type_id);
        }
        q = q.bind(now_rfc3339()).bind(id);
        q.execute(&mut *tx).await?;

        for size_id in &patch.size_ids_to_add {
            sqlx::query("INSERT OR IGNORE INTO product_sizes (product_id, size_id) VALUES (?, ?)")
                .bind(id)
                .bind(size_id)
                .execute(&mut *tx)
                .await?;
        }
        for size_id in &patch.size_ids_to_remove {
            sqlx::query("DELETE FROM product_sizes WHERE product_id = ? AND size_id = ?")
                .bind(id)
                .bind(size_id)
                .execute(&mut *tx)
                .await?;
        }
        for color_id in &patch.color_ids_to_add {
            sqlx::query("INSERT OR IGNORE INTO product_colors (product_id, color_id) VALUES (?, ?)")
                .bind(id)
                .bind(color_id)
                .execute(&mut *tx)
                .await?;
        }
        for color_id in &patch.color_ids_to_remove {
            sqlx::query("DELETE FROM product_colors WHERE product_id = ? AND color_id = ?")
                .bind(id)
                .bind(color_id)
                .execute(&mut *tx)
                .await?;
        }

        Self::regenerate_inventory_grid(&mut tx, id).await?;
        // Drop cells for combinations that no longer exist.
        sqlx::query(
            "DELETE FROM inventory WHERE product_id = ?
             AND (size_id NOT IN (SELECT size_id FROM product_sizes WHERE product_id = ?)
               OR color_id NOT IN (SELECT color_id FROM product_colors WHERE product_id = ?))",
        )
        .bind(id)
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_product(id).await
    }

    /// Insert zero-quantity cells for every (size, color) combination that
    /// does not have one yet. Existing quantities are untouched.
    async fn regenerate_inventory_grid(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        product_id: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO inventory (product_id, size_id, color_id, quantity)
             SELECT ps.product_id, ps.size_id, pc.color_id, 0
             FROM product_sizes ps
             JOIN product_colors pc ON pc.product_id = ps.product_id
             WHERE ps.product_id = ?",
        )
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // ─── Listing ────────────────────────────────────────────────────────────

    fn filter_conditions(f: &ProductFilter) -> (String, Vec<BindArg>) {
        let mut cond = String::new();
        let mut binds = Vec::new();

        if let Some(ref search) = f.search {
            let pattern = format!("%{search}%");
            cond.push_str(" AND (name LIKE ? OR description LIKE ?)");
            binds.push(BindArg::Text(pattern.clone()));
            binds.push(BindArg::Text(pattern));
        }
        if let Some(min) = f.min_price_cents {
            cond.push_str(" AND price_cents >= ?");
            binds.push(BindArg::Int(min));
        }
        if let Some(max) = f.max_price_cents {
            cond.push_str(" AND price_cents <= ?");
            binds.push(BindArg::Int(max));
        }
        if let Some(ref size_id) = f.size_id {
            cond.push_str(
                " AND EXISTS (SELECT 1 FROM product_sizes ps
                   WHERE ps.product_id = products.id AND ps.size_id = ?)",
            );
            binds.push(BindArg::Text(size_id.clone()));
        }
        if let Some(ref color_id) = f.color_id {
            cond.push_str(
                " AND EXISTS (SELECT 1 FROM product_colors pc
                   WHERE pc.product_id = products.id AND pc.color_id = ?)",
            );
            binds.push(BindArg::Text(color_id.clone()));
        }

        (cond, binds)
    }

    /// Sort column/direction whitelist — filter input never reaches the SQL
    /// string unescaped.
    fn sort_clause(f: &ProductFilter) -> (&'static str, &'static str) {
        let col = match f.sort_by.as_deref() {
            Some("name") => "name",
            Some("price_cents") | Some("price") => "price_cents",
            _ => "created_at",
        };
        let dir = match f.sort_order.as_deref() {
            Some("asc") => "ASC",
            _ => "DESC",
        };
        (col, dir)
    }

    /// List active products matching the filter, plus the unpaginated total.
    pub async fn list_products(&self, f: &ProductFilter) -> Result<(Vec<ProductBundle>, i64)> {
        let (cond, binds) = Self::filter_conditions(f);
        let (sort_col, sort_dir) = Self::sort_clause(f);

        let sql = format!(
            "SELECT * FROM products WHERE is_active = 1{cond}
             ORDER BY {sort_col} {sort_dir} LIMIT ? OFFSET ?"
        );
        let mut q = sqlx::query_as::<_, ProductRow>(&sql);
        for b in &binds {
            q = match b {
                BindArg::Text(s) => q.bind(s.clone()),
                BindArg::Int(i) => q.bind(*i),
            };
        }
        q = q.bind(f.limit).bind(f.offset);
        let rows = with_timeout(async { Ok(q.fetch_all(&self.pool).await?) }).await?;

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE is_active = 1{cond}");
        let mut cq = sqlx::query_scalar::<_, i64>(&count_sql);
        for b in &binds {
            cq = match b {
                BindArg::Text(s) => cq.bind(s.clone()),
                BindArg::Int(i) => cq.bind(*i),
            };
        }
        let total = cq.fetch_one(&self.pool).await?;

        let mut bundles = Vec::with_capacity(rows.len());
        for product in rows {
            bundles.push(self.bundle(product).await?);
        }
        Ok((bundles, total))
    }

    /// Assemble the embedded pieces every product response carries.
    pub async fn bundle(&self, product: ProductRow) -> Result<ProductBundle> {
        let primary_image = self.primary_image(&product.id).await?;
        let sizes = self.product_sizes(&product.id).await?;
        let colors = self.product_colors(&product.id).await?;
        let inventory = self.inventory_for_product(&product.id).await?;
        Ok(ProductBundle {
            product,
            primary_image,
            sizes,
            colors,
            inventory,
        })
    }

    pub async fn product_sizes(&self, product_id: &str) -> Result<Vec<SizeRow>> {
        Ok(sqlx::query_as(
            "SELECT s.id, s.name FROM sizes s
             JOIN product_sizes ps ON ps.size_id = s.id
             WHERE ps.product_id = ? ORDER BY s.rowid",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn product_colors(&self, product_id: &str) -> Result<Vec<ColorRow>> {
        Ok(sqlx::query_as(
            "SELECT c.id, c.name, c.hex_code, c.image_url FROM colors c
             JOIN product_colors pc ON pc.color_id = c.id
             WHERE pc.product_id = ? ORDER BY c.name",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Images ─────────────────────────────────────────────────────────────

    pub async fn list_images(&self, product_id: &str) -> Result<Vec<ProductImageRow>> {
        Ok(sqlx::query_as(
            "SELECT * FROM product_images WHERE product_id = ? ORDER BY created_at",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn primary_image(&self, product_id: &str) -> Result<Option<ProductImageRow>> {
        Ok(sqlx::query_as(
            "SELECT * FROM product_images
             WHERE product_id = ? AND image_type = 'primary'
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Register an image URL. A new "primary" demotes the previous primary
    /// to "detail" so the invariant of at most one primary holds.
    pub async fn add_image(
        &self,
        product_id: &str,
        url: &str,
        image_type: &str,
        alt_text: &str,
    ) -> Result<ProductImageRow> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let mut tx = self.pool.begin().await?;
        if image_type == "primary" {
            sqlx::query(
                "UPDATE product_images SET image_type = 'detail'
                 WHERE product_id = ? AND image_type = 'primary'",
            )
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query(
            "INSERT INTO product_images (id, product_id, url, image_type, alt_text, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(product_id)
        .bind(url)
        .bind(image_type)
        .bind(alt_text)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(ProductImageRow {
            id,
            product_id: product_id.to_string(),
            url: url.to_string(),
            image_type: image_type.to_string(),
            alt_text: alt_text.to_string(),
            created_at: now,
        })
    }

    pub async fn delete_image(&self, product_id: &str, image_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product_images WHERE id = ? AND product_id = ?")
            .bind(image_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Inventory ──────────────────────────────────────────────────────────

    pub async fn inventory_for_product(&self, product_id: &str) -> Result<Vec<InventoryCellRow>> {
        Ok(sqlx::query_as(
            "SELECT i.product_id, i.size_id, i.color_id, i.quantity,
                    s.name AS size_name, c.name AS color_name, c.hex_code
             FROM inventory i
             JOIN sizes s ON s.id = i.size_id
             JOIN colors c ON c.id = i.color_id
             WHERE i.product_id = ?
             ORDER BY s.rowid, c.name",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Set the absolute quantity of one stock cell (upsert).
    pub async fn set_inventory(
        &self,
        product_id: &str,
        size_id: &str,
        color_id: &str,
        quantity: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO inventory (product_id, size_id, color_id, quantity) VALUES (?, ?, ?, ?)
             ON CONFLICT(product_id, size_id, color_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(product_id)
        .bind(size_id)
        .bind(color_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn low_stock(&self, threshold: i64, limit: i64) -> Result<Vec<LowStockRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT i.product_id, p.name AS product_name,
                        s.name AS size_name, c.name AS color_name, i.quantity
                 FROM inventory i
                 JOIN products p ON p.id = i.product_id
                 JOIN sizes s ON s.id = i.size_id
                 JOIN colors c ON c.id = i.color_id
                 WHERE i.quantity <= ? AND p.is_active = 1
                 ORDER BY i.quantity ASC
                 LIMIT ?",
            )
            .bind(threshold)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn count_active_products(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
