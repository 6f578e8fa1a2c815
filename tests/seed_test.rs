//! The demo seed must produce a coherent storefront.

use stitchd::config::StoreConfig;
use stitchd::storage::Storage;
use stitchd::AppContext;

async fn test_ctx() -> (AppContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(None, Some(dir.path().to_path_buf()), None, None);
    let storage = Storage::new(dir.path()).await.unwrap();
    let ctx = AppContext::new(config, storage).unwrap();
    (ctx, dir)
}

#[tokio::test]
async fn seed_builds_a_complete_catalog() {
    let (ctx, _dir) = test_ctx().await;

    stitchd::seed::seed_demo(&ctx, false).await.unwrap();

    assert_eq!(ctx.catalog.count_active_products().await.unwrap(), 3);
    assert_eq!(ctx.catalog.list_sizes().await.unwrap().len(), 5);
    assert_eq!(ctx.catalog.list_colors().await.unwrap().len(), 4);
    assert_eq!(ctx.catalog.list_design_types().await.unwrap().len(), 2);

    // Every product has a full 5×4 grid, all stocked.
    let (products, _) = ctx
        .catalog
        .list_products(&stitchd::catalog::ProductFilter {
            limit: 10,
            offset: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    for bundle in &products {
        assert_eq!(bundle.inventory.len(), 20);
        assert!(bundle.inventory.iter().all(|c| c.quantity >= 10));
        assert!(bundle.primary_image.is_some());
    }

    // The admin account can be looked up and is an admin.
    let admin = ctx
        .storage
        .get_user_by_email("admin@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(admin.is_admin);

    // Demo shoppers have default addresses to order against.
    let john = ctx
        .storage
        .get_user_by_email("john@example.com")
        .await
        .unwrap()
        .unwrap();
    let addresses = ctx.storage.list_addresses(&john.id).await.unwrap();
    assert_eq!(addresses.len(), 1);
    assert!(addresses[0].is_default);

    // One public, one private design.
    let (own, total) = ctx.designs.list_user_designs(&john.id, 10, 0).await.unwrap();
    assert_eq!((own.len() as i64, total), (2, 2));
    let (public, _) = ctx.designs.list_public_designs(10, 0).await.unwrap();
    assert_eq!(public.len(), 1);
}

#[tokio::test]
async fn seed_refuses_to_clobber_without_force() {
    let (ctx, _dir) = test_ctx().await;

    stitchd::seed::seed_demo(&ctx, false).await.unwrap();
    assert!(stitchd::seed::seed_demo(&ctx, false).await.is_err());

    // --force wipes and rebuilds.
    stitchd::seed::seed_demo(&ctx, true).await.unwrap();
    assert_eq!(ctx.catalog.count_active_products().await.unwrap(), 3);
}
