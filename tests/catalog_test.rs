//! Integration tests for catalog listing, filtering, and inventory upkeep.

use stitchd::catalog::{NewProduct, ProductFilter, ProductUpdate};
use stitchd::config::StoreConfig;
use stitchd::storage::Storage;
use stitchd::AppContext;

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Fixture {
    ctx: AppContext,
    _dir: tempfile::TempDir,
    size_s: String,
    size_m: String,
    color_black: String,
    color_white: String,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(None, Some(dir.path().to_path_buf()), None, None);
    let storage = Storage::new(dir.path()).await.unwrap();
    let ctx = AppContext::new(config, storage).unwrap();

    let size_s = ctx.catalog.create_size("S").await.unwrap().id;
    let size_m = ctx.catalog.create_size("M").await.unwrap().id;
    let color_black = ctx
        .catalog
        .create_color("Black", "#000000", None)
        .await
        .unwrap()
        .id;
    let color_white = ctx
        .catalog
        .create_color("White", "#FFFFFF", None)
        .await
        .unwrap()
        .id;

    Fixture {
        ctx,
        _dir: dir,
        size_s,
        size_m,
        color_black,
        color_white,
    }
}

impl Fixture {
    async fn product(&self, name: &str, price_cents: i64, sizes: &[&str], colors: &[&str]) -> String {
        self.ctx
            .catalog
            .create_product(&NewProduct {
                name: name.to_string(),
                description: format!("{name} — a very fine shirt indeed"),
                price_cents,
                design_type_id: None,
                size_ids: sizes.iter().map(|s| s.to_string()).collect(),
                color_ids: colors.iter().map(|c| c.to_string()).collect(),
            })
            .await
            .unwrap()
            .id
    }

    fn filter(&self) -> ProductFilter {
        ProductFilter {
            limit: 10,
            offset: 0,
            ..Default::default()
        }
    }
}

// ─── Listing and filters ──────────────────────────────────────────────────────

#[tokio::test]
async fn listing_filters_and_paginates() {
    let f = fixture().await;
    let sizes = [f.size_s.as_str(), f.size_m.as_str()];
    let colors = [f.color_black.as_str(), f.color_white.as_str()];

    f.product("Basic T-Shirt", 1999, &sizes, &colors).await;
    f.product("Premium T-Shirt", 2999, &sizes, &colors).await;
    let s_only = f.product("Limited Tee", 4999, &[f.size_s.as_str()], &colors).await;

    // No filter: everything, newest first by default.
    let (all, total) = f.ctx.catalog.list_products(&f.filter()).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(all.len(), 3);

    // Search matches name case-insensitively.
    let mut filter = f.filter();
    filter.search = Some("premium".to_string());
    let (hits, total) = f.ctx.catalog.list_products(&filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(hits[0].product.name, "Premium T-Shirt");

    // Price window.
    let mut filter = f.filter();
    filter.min_price_cents = Some(2500);
    filter.max_price_cents = Some(3500);
    let (hits, _) = f.ctx.catalog.list_products(&filter).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product.price_cents, 2999);

    // Size filter: only the M-carrying products.
    let mut filter = f.filter();
    filter.size_id = Some(f.size_m.clone());
    let (hits, total) = f.ctx.catalog.list_products(&filter).await.unwrap();
    assert_eq!(total, 2);
    assert!(hits.iter().all(|b| b.product.id != s_only));

    // Price sort ascending.
    let mut filter = f.filter();
    filter.sort_by = Some("price_cents".to_string());
    filter.sort_order = Some("asc".to_string());
    let (hits, _) = f.ctx.catalog.list_products(&filter).await.unwrap();
    let prices: Vec<i64> = hits.iter().map(|b| b.product.price_cents).collect();
    assert_eq!(prices, vec![1999, 2999, 4999]);

    // Pagination.
    let mut filter = f.filter();
    filter.limit = 2;
    let (page1, total) = f.ctx.catalog.list_products(&filter).await.unwrap();
    assert_eq!((page1.len(), total), (2, 3));
    filter.offset = 2;
    let (page2, _) = f.ctx.catalog.list_products(&filter).await.unwrap();
    assert_eq!(page2.len(), 1);
}

#[tokio::test]
async fn inactive_products_are_hidden_from_listing() {
    let f = fixture().await;
    let id = f
        .product("Retired Tee", 1599, &[f.size_s.as_str()], &[f.color_black.as_str()])
        .await;

    let patch = ProductUpdate {
        is_active: Some(false),
        ..Default::default()
    };
    f.ctx.catalog.update_product(&id, &patch).await.unwrap().unwrap();

    let (hits, total) = f.ctx.catalog.list_products(&f.filter()).await.unwrap();
    assert_eq!((hits.len(), total), (0, 0));
    // Direct lookup still finds it (admin paths need that).
    assert!(f.ctx.catalog.get_product(&id).await.unwrap().is_some());
}

// ─── Inventory grid upkeep ────────────────────────────────────────────────────

#[tokio::test]
async fn creation_builds_a_zero_inventory_grid() {
    let f = fixture().await;
    let id = f
        .product(
            "Grid Tee",
            1999,
            &[f.size_s.as_str(), f.size_m.as_str()],
            &[f.color_black.as_str(), f.color_white.as_str()],
        )
        .await;

    let cells = f.ctx.catalog.inventory_for_product(&id).await.unwrap();
    assert_eq!(cells.len(), 4);
    assert!(cells.iter().all(|c| c.quantity == 0));
}

#[tokio::test]
async fn adding_a_size_extends_the_grid_and_keeps_quantities() {
    let f = fixture().await;
    let id = f
        .product("Grow Tee", 1999, &[f.size_s.as_str()], &[f.color_black.as_str()])
        .await;
    f.ctx
        .catalog
        .set_inventory(&id, &f.size_s, &f.color_black, 7)
        .await
        .unwrap();

    let patch = ProductUpdate {
        size_ids_to_add: vec![f.size_m.clone()],
        ..Default::default()
    };
    f.ctx.catalog.update_product(&id, &patch).await.unwrap().unwrap();

    let cells = f.ctx.catalog.inventory_for_product(&id).await.unwrap();
    assert_eq!(cells.len(), 2);
    let existing = cells
        .iter()
        .find(|c| c.size_id == f.size_s)
        .unwrap();
    assert_eq!(existing.quantity, 7);
    let added = cells.iter().find(|c| c.size_id == f.size_m).unwrap();
    assert_eq!(added.quantity, 0);
}

#[tokio::test]
async fn removing_a_size_drops_its_cells() {
    let f = fixture().await;
    let id = f
        .product(
            "Shrink Tee",
            1999,
            &[f.size_s.as_str(), f.size_m.as_str()],
            &[f.color_black.as_str()],
        )
        .await;

    let patch = ProductUpdate {
        size_ids_to_remove: vec![f.size_m.clone()],
        ..Default::default()
    };
    f.ctx.catalog.update_product(&id, &patch).await.unwrap().unwrap();

    let cells = f.ctx.catalog.inventory_for_product(&id).await.unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].size_id, f.size_s);
}

// ─── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn a_new_primary_image_demotes_the_previous_one() {
    let f = fixture().await;
    let id = f
        .product("Pictured Tee", 1999, &[f.size_s.as_str()], &[f.color_black.as_str()])
        .await;

    f.ctx
        .catalog
        .add_image(&id, "https://cdn.example.com/front.png", "primary", "front")
        .await
        .unwrap();
    let second = f
        .ctx
        .catalog
        .add_image(&id, "https://cdn.example.com/better.png", "primary", "better")
        .await
        .unwrap();

    let images = f.ctx.catalog.list_images(&id).await.unwrap();
    assert_eq!(images.len(), 2);
    let primaries: Vec<_> = images.iter().filter(|i| i.image_type == "primary").collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].id, second.id);

    let primary = f.ctx.catalog.primary_image(&id).await.unwrap().unwrap();
    assert_eq!(primary.url, "https://cdn.example.com/better.png");

    assert!(f.ctx.catalog.delete_image(&id, &second.id).await.unwrap());
    assert!(!f.ctx.catalog.delete_image(&id, &second.id).await.unwrap());
}

// ─── Low stock ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn low_stock_reports_cells_at_or_below_threshold() {
    let f = fixture().await;
    let id = f
        .product(
            "Scarce Tee",
            1999,
            &[f.size_s.as_str(), f.size_m.as_str()],
            &[f.color_black.as_str()],
        )
        .await;
    f.ctx
        .catalog
        .set_inventory(&id, &f.size_s, &f.color_black, 2)
        .await
        .unwrap();
    f.ctx
        .catalog
        .set_inventory(&id, &f.size_m, &f.color_black, 50)
        .await
        .unwrap();

    let low = f.ctx.catalog.low_stock(5, 100).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].product_name, "Scarce Tee");
    assert_eq!(low[0].quantity, 2);
}
