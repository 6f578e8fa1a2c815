//! Integration tests for order placement and cancellation.
//!
//! Tests cover:
//! 1. Successful placement computes the total and decrements stock
//! 2. Insufficient stock rejects the order with the available quantity
//! 3. A failing line item rolls back earlier decrements
//! 4. Unknown (size, color) cells are rejected
//! 5. Address ownership is enforced
//! 6. Cancellation restores stock, once
//! 7. Admin cancellation of a PENDING order restores stock

use stitchd::auth;
use stitchd::catalog::NewProduct;
use stitchd::config::StoreConfig;
use stitchd::orders::{NewOrderItem, OrderError};
use stitchd::storage::Storage;
use stitchd::AppContext;

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Fixture {
    ctx: AppContext,
    _dir: tempfile::TempDir,
    user_id: String,
    address_id: String,
    product_id: String,
    size_id: String,
    color_id: String,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(None, Some(dir.path().to_path_buf()), None, None);
    let storage = Storage::new(dir.path()).await.unwrap();
    let ctx = AppContext::new(config, storage).unwrap();

    let hash = auth::hash_password("password123").unwrap();
    let user = ctx
        .storage
        .create_user("shopper@example.com", "Shopper", &hash, "local", true)
        .await
        .unwrap();
    let address = ctx
        .storage
        .create_address(
            &user.id,
            "123 Main St",
            "New York",
            "NY",
            "10001",
            "USA",
            None,
            true,
        )
        .await
        .unwrap();

    let size = ctx.catalog.create_size("M").await.unwrap();
    let color = ctx.catalog.create_color("Black", "#000000", None).await.unwrap();
    let product = ctx
        .catalog
        .create_product(&NewProduct {
            name: "Basic T-Shirt".to_string(),
            description: "A comfortable cotton t-shirt".to_string(),
            price_cents: 1999,
            design_type_id: None,
            size_ids: vec![size.id.clone()],
            color_ids: vec![color.id.clone()],
        })
        .await
        .unwrap();
    ctx.catalog
        .set_inventory(&product.id, &size.id, &color.id, 10)
        .await
        .unwrap();

    Fixture {
        ctx,
        _dir: dir,
        user_id: user.id,
        address_id: address.id,
        product_id: product.id,
        size_id: size.id,
        color_id: color.id,
    }
}

impl Fixture {
    fn item(&self, quantity: i64) -> NewOrderItem {
        NewOrderItem {
            product_id: self.product_id.clone(),
            size_id: self.size_id.clone(),
            color_id: self.color_id.clone(),
            quantity,
            design_url: None,
        }
    }

    async fn stock(&self) -> i64 {
        self.ctx
            .catalog
            .inventory_for_product(&self.product_id)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.size_id == self.size_id && c.color_id == self.color_id)
            .unwrap()
            .quantity
    }
}

// ─── Test 1: successful placement ────────────────────────────────────────────

#[tokio::test]
async fn placement_computes_total_and_decrements_stock() {
    let f = fixture().await;

    let (order, items) = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(3)], 25)
        .await
        .unwrap();

    assert_eq!(order.status, "PENDING");
    assert_eq!(order.payment_status, "PENDING");
    assert_eq!(order.total_cents, 3 * 1999);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price_cents, 1999);
    assert_eq!(f.stock().await, 7);

    let detail = f.ctx.orders.items_detail(&order.id).await.unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0].product_name, "Basic T-Shirt");
    assert_eq!(detail[0].size_name, "M");
}

// ─── Test 2: insufficient stock ──────────────────────────────────────────────

#[tokio::test]
async fn insufficient_stock_reports_available_quantity() {
    let f = fixture().await;

    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(11)], 25)
        .await
        .unwrap_err();

    match err {
        OrderError::InsufficientStock {
            product_name,
            available,
        } => {
            assert_eq!(product_name, "Basic T-Shirt");
            assert_eq!(available, 10);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    // Nothing was taken.
    assert_eq!(f.stock().await, 10);
}

// ─── Test 3: rollback atomicity ──────────────────────────────────────────────

#[tokio::test]
async fn failed_line_item_rolls_back_earlier_decrements() {
    let f = fixture().await;

    // Second line asks for a cell that does not exist — the whole order must
    // fail and the first line's decrement must be rolled back.
    let bogus = NewOrderItem {
        product_id: f.product_id.clone(),
        size_id: "no-such-size".to_string(),
        color_id: f.color_id.clone(),
        quantity: 1,
        design_url: None,
    };
    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(4), bogus], 25)
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::VariantUnavailable { .. }));
    assert_eq!(f.stock().await, 10);
    let (orders, total) = f
        .ctx
        .orders
        .list_user_orders(&f.user_id, None, 10, 0)
        .await
        .unwrap();
    assert!(orders.is_empty());
    assert_eq!(total, 0);
}

// ─── Test 4: unknown variant ─────────────────────────────────────────────────

#[tokio::test]
async fn unknown_variant_is_rejected() {
    let f = fixture().await;

    let item = NewOrderItem {
        size_id: "nope".to_string(),
        ..f.item(1)
    };
    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[item], 25)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::VariantUnavailable { .. }));
}

// ─── Test 5: address ownership ───────────────────────────────────────────────

#[tokio::test]
async fn foreign_address_is_rejected() {
    let f = fixture().await;

    let hash = auth::hash_password("password123").unwrap();
    let other = f
        .ctx
        .storage
        .create_user("other@example.com", "Other", &hash, "local", true)
        .await
        .unwrap();
    let other_address = f
        .ctx
        .storage
        .create_address(&other.id, "9 Elm St", "Boston", "MA", "02101", "USA", None, true)
        .await
        .unwrap();

    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &other_address.id, &[f.item(1)], 25)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::AddressNotFound));
    assert_eq!(f.stock().await, 10);
}

// ─── Test 6: cancellation restores stock, once ───────────────────────────────

#[tokio::test]
async fn cancel_restores_stock_exactly_once() {
    let f = fixture().await;

    let (order, _) = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(5)], 25)
        .await
        .unwrap();
    assert_eq!(f.stock().await, 5);

    let cancelled = f.ctx.orders.cancel_order(&order.id, &f.user_id).await.unwrap();
    assert_eq!(cancelled.status, "CANCELLED");
    assert_eq!(f.stock().await, 10);

    // A second cancel must not restock again.
    let err = f
        .ctx
        .orders
        .cancel_order(&order.id, &f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotPending));
    assert_eq!(f.stock().await, 10);
}

#[tokio::test]
async fn cancel_requires_pending_status() {
    let f = fixture().await;

    let (order, _) = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(2)], 25)
        .await
        .unwrap();

    f.ctx
        .orders
        .admin_update_order(
            &order.id,
            Some(stitchd::orders::OrderStatus::Shipped),
            None,
            Some("TRACK-1"),
        )
        .await
        .unwrap();

    let err = f
        .ctx
        .orders
        .cancel_order(&order.id, &f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotPending));
    // Shipped orders keep their stock claim.
    assert_eq!(f.stock().await, 8);
}

// ─── Test 7: admin cancellation ──────────────────────────────────────────────

#[tokio::test]
async fn admin_cancel_of_pending_order_restocks() {
    let f = fixture().await;

    let (order, _) = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(6)], 25)
        .await
        .unwrap();
    assert_eq!(f.stock().await, 4);

    let updated = f
        .ctx
        .orders
        .admin_update_order(
            &order.id,
            Some(stitchd::orders::OrderStatus::Cancelled),
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.status, "CANCELLED");
    assert_eq!(f.stock().await, 10);
}

#[tokio::test]
async fn order_limits_are_enforced() {
    let f = fixture().await;

    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[], 25)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::EmptyOrder));

    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(1), f.item(1)], 1)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::TooManyItems { max: 1 }));

    let err = f
        .ctx
        .orders
        .place_order(&f.user_id, &f.address_id, &[f.item(0)], 25)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidItem));
}
