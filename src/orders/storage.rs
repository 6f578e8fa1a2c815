//! Order queries and the placement/cancellation transactions.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::storage::{now_rfc3339, with_timeout};

use super::model::{
    NewOrderItem, OrderError, OrderItemDetailRow, OrderItemRow, OrderRow, OrderStatus,
    PaymentStatus, compute_total_cents, MAX_ITEM_QUANTITY,
};

#[derive(Clone)]
pub struct OrderStorage {
    pool: SqlitePool,
}

impl OrderStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Placement ──────────────────────────────────────────────────────────

    /// Place an order atomically.
    ///
    /// Everything — address ownership, product lookups, the conditional
    /// inventory decrements, and the order/item inserts — happens inside one
    /// transaction. Any failure returns early, dropping the transaction and
    /// rolling every decrement back, so stock is never lost to a rejected
    /// order.
    pub async fn place_order(
        &self,
        user_id: &str,
        address_id: &str,
        items: &[NewOrderItem],
        max_items: usize,
    ) -> Result<(OrderRow, Vec<OrderItemRow>), OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if items.len() > max_items {
            return Err(OrderError::TooManyItems { max: max_items });
        }
        for item in items {
            if item.quantity < 1 || item.quantity > MAX_ITEM_QUANTITY {
                return Err(OrderError::InvalidItem);
            }
        }

        let mut tx = self.pool.begin().await?;

        // The address must belong to the ordering user.
        let owned: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE id = ? AND user_id = ?")
                .bind(address_id)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        if owned.0 == 0 {
            return Err(OrderError::AddressNotFound);
        }

        let mut lines: Vec<(i64, i64)> = Vec::with_capacity(items.len());
        let mut priced: Vec<(&NewOrderItem, i64)> = Vec::with_capacity(items.len());

        for item in items {
            let product: Option<(String, i64)> = sqlx::query_as(
                "SELECT name, price_cents FROM products WHERE id = ? AND is_active = 1",
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *tx)
            .await?;
            let Some((product_name, price_cents)) = product else {
                return Err(OrderError::ProductUnavailable {
                    product_id: item.product_id.clone(),
                });
            };

            // Conditional decrement — the predicate keeps quantity >= 0 and
            // `rows_affected` tells us whether the claim succeeded, without a
            // read-then-write race.
            let claimed = sqlx::query(
                "UPDATE inventory SET quantity = quantity - ?
                 WHERE product_id = ? AND size_id = ? AND color_id = ? AND quantity >= ?",
            )
            .bind(item.quantity)
            .bind(&item.product_id)
            .bind(&item.size_id)
            .bind(&item.color_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if claimed.rows_affected() == 0 {
                let cell: Option<(i64,)> = sqlx::query_as(
                    "SELECT quantity FROM inventory
                     WHERE product_id = ? AND size_id = ? AND color_id = ?",
                )
                .bind(&item.product_id)
                .bind(&item.size_id)
                .bind(&item.color_id)
                .fetch_optional(&mut *tx)
                .await?;
                return Err(match cell {
                    None => OrderError::VariantUnavailable {
                        product_id: item.product_id.clone(),
                    },
                    Some((available,)) => OrderError::InsufficientStock {
                        product_name,
                        available,
                    },
                });
            }

            lines.push((price_cents, item.quantity));
            priced.push((item, price_cents));
        }

        let order_id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let total_cents = compute_total_cents(&lines);

        sqlx::query(
            "INSERT INTO orders (id, user_id, address_id, status, payment_status, total_cents, created_at, updated_at)
             VALUES (?, ?, ?, 'PENDING', 'PENDING', ?, ?, ?)",
        )
        .bind(&order_id)
        .bind(user_id)
        .bind(address_id)
        .bind(total_cents)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let mut item_rows = Vec::with_capacity(priced.len());
        for (item, price_cents) in priced {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, size_id, color_id, quantity, price_cents, design_url)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&order_id)
            .bind(&item.product_id)
            .bind(&item.size_id)
            .bind(&item.color_id)
            .bind(item.quantity)
            .bind(price_cents)
            .bind(&item.design_url)
            .execute(&mut *tx)
            .await?;
            item_rows.push(OrderItemRow {
                id,
                order_id: order_id.clone(),
                product_id: item.product_id.clone(),
                size_id: item.size_id.clone(),
                color_id: item.color_id.clone(),
                quantity: item.quantity,
                price_cents,
                design_url: item.design_url.clone(),
            });
        }

        tx.commit().await?;

        let order = self
            .get_order(&order_id)
            .await
            .map_err(|_| OrderError::NotFound)?
            .ok_or(OrderError::NotFound)?;
        Ok((order, item_rows))
    }

    // ─── Cancellation ───────────────────────────────────────────────────────

    /// Cancel a user's own PENDING order and restore its stock, atomically.
    pub async fn cancel_order(&self, id: &str, user_id: &str) -> Result<OrderRow, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order: Option<OrderRow> =
            sqlx::query_as("SELECT * FROM orders WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if order.is_none() {
            return Err(OrderError::NotFound);
        }

        // The status guard makes cancellation idempotent under races: a
        // concurrent cancel or an admin transition wins, and we see zero
        // affected rows.
        let updated = sqlx::query(
            "UPDATE orders SET status = 'CANCELLED', updated_at = ?
             WHERE id = ? AND status = 'PENDING'",
        )
        .bind(now_rfc3339())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(OrderError::NotPending);
        }

        Self::restock_items(&mut tx, id).await?;
        tx.commit().await?;

        self.get_order(id)
            .await
            .map_err(|_| OrderError::NotFound)?
            .ok_or(OrderError::NotFound)
    }

    async fn restock_items(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        order_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE inventory SET quantity = quantity + (
                 SELECT oi.quantity FROM order_items oi
                 WHERE oi.order_id = ? AND oi.product_id = inventory.product_id
                   AND oi.size_id = inventory.size_id AND oi.color_id = inventory.color_id
             )
             WHERE (product_id, size_id, color_id) IN (
                 SELECT product_id, size_id, color_id FROM order_items WHERE order_id = ?
             )",
        )
        .bind(order_id)
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // ─── Admin updates ──────────────────────────────────────────────────────

    /// Admin transition of status / payment status / tracking number.
    ///
    /// Cancelling a PENDING order through this path restocks exactly like the
    /// user-facing cancel does.
    pub async fn admin_update_order(
        &self,
        id: &str,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
        tracking_number: Option<&str>,
    ) -> Result<OrderRow, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(order) = order else {
            return Err(OrderError::NotFound);
        };

        if let Some(status) = status {
            if status == OrderStatus::Cancelled && order.status == OrderStatus::Pending.as_str() {
                Self::restock_items(&mut tx, id).await?;
            }
            sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now_rfc3339())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(payment_status) = payment_status {
            sqlx::query("UPDATE orders SET payment_status = ?, updated_at = ? WHERE id = ?")
                .bind(payment_status.as_str())
                .bind(now_rfc3339())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(tracking) = tracking_number {
            sqlx::query("UPDATE orders SET tracking_number = ?, updated_at = ? WHERE id = ?")
                .bind(tracking)
                .bind(now_rfc3339())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_order(id)
            .await
            .map_err(|_| OrderError::NotFound)?
            .ok_or(OrderError::NotFound)
    }

    // ─── Lookups ────────────────────────────────────────────────────────────

    pub async fn get_order(&self, id: &str) -> Result<Option<OrderRow>> {
        Ok(sqlx::query_as("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Fetch an order only if it belongs to `user_id`.
    pub async fn get_user_order(&self, id: &str, user_id: &str) -> Result<Option<OrderRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM orders WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn list_user_orders(
        &self,
        user_id: &str,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderRow>, i64)> {
        let (rows, total) = match status {
            Some(status) => {
                let rows = with_timeout(async {
                    Ok(sqlx::query_as(
                        "SELECT * FROM orders WHERE user_id = ? AND status = ?
                         ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    )
                    .bind(user_id)
                    .bind(status)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?)
                })
                .await?;
                let total: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM orders WHERE user_id = ? AND status = ?",
                )
                .bind(user_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
                (rows, total.0)
            }
            None => {
                let rows = with_timeout(async {
                    Ok(sqlx::query_as(
                        "SELECT * FROM orders WHERE user_id = ?
                         ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    )
                    .bind(user_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?)
                })
                .await?;
                let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total.0)
            }
        };
        Ok((rows, total))
    }

    pub async fn list_all_orders(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderRow>, i64)> {
        let (rows, total) = match status {
            Some(status) => {
                let rows = with_timeout(async {
                    Ok(sqlx::query_as(
                        "SELECT * FROM orders WHERE status = ?
                         ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    )
                    .bind(status)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?)
                })
                .await?;
                let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = ?")
                    .bind(status)
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total.0)
            }
            None => {
                let rows = with_timeout(async {
                    Ok(sqlx::query_as(
                        "SELECT * FROM orders ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    )
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?)
                })
                .await?;
                let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total.0)
            }
        };
        Ok((rows, total))
    }

    /// Items of an order with product/size/color names and the primary
    /// product image joined in.
    pub async fn items_detail(&self, order_id: &str) -> Result<Vec<OrderItemDetailRow>> {
        Ok(sqlx::query_as(
            "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                    s.name AS size_name, c.name AS color_name, c.hex_code,
                    oi.quantity, oi.price_cents, oi.design_url,
                    (SELECT pi.url FROM product_images pi
                     WHERE pi.product_id = oi.product_id AND pi.image_type = 'primary'
                     ORDER BY pi.created_at DESC LIMIT 1) AS image_url
             FROM order_items oi
             JOIN products p ON p.id = oi.product_id
             JOIN sizes s ON s.id = oi.size_id
             JOIN colors c ON c.id = oi.color_id
             WHERE oi.order_id = ?",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Dashboard aggregates ───────────────────────────────────────────────

    pub async fn count_orders(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn count_orders_by_status(&self) -> Result<Vec<(String, i64)>> {
        Ok(
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Revenue recognized so far: sum of paid order totals, in cents.
    pub async fn revenue_cents(&self) -> Result<i64> {
        let row: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(total_cents) FROM orders WHERE payment_status = 'PAID'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0.unwrap_or(0))
    }

    pub async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
