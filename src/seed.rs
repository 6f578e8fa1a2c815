//! Demo data seeding and admin bootstrap (`stitchd seed`, `stitchd create-admin`).

use anyhow::{bail, Result};
use tracing::info;

use crate::auth;
use crate::catalog::NewProduct;
use crate::storage::{Storage, UserRow};
use crate::AppContext;

/// Create (or promote) an admin account.
///
/// An existing user with this email keeps their password and gains the admin
/// flag; otherwise a fresh verified admin account is created.
pub async fn ensure_admin(
    storage: &Storage,
    email: &str,
    password: &str,
    name: &str,
) -> Result<UserRow> {
    if let Some(user) = storage.get_user_by_email(email).await? {
        storage.set_admin(email, true).await?;
        info!(email = %user.email, "promoted existing user to admin");
        return storage
            .get_user(&user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user vanished during promote"));
    }

    let password_hash = auth::hash_password(password)?;
    let user = storage
        .create_user(email, name, &password_hash, "local", true)
        .await?;
    storage.set_admin(email, true).await?;
    info!(email = %user.email, "created admin account");
    storage
        .get_user(&user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user vanished after create"))
}

/// Populate a demo catalog: sizes, colors, design types, three products with
/// a full inventory grid, two demo shoppers, an admin, and sample designs.
///
/// Refuses to touch a non-empty catalog unless `force` is set; `force` wipes
/// the storefront tables first.
pub async fn seed_demo(ctx: &AppContext, force: bool) -> Result<()> {
    let existing = ctx.catalog.count_active_products().await?;
    if existing > 0 {
        if !force {
            bail!("catalog already has {existing} products — re-run with --force to wipe and reseed");
        }
        wipe(ctx).await?;
    }

    info!("seeding demo data");

    // Sizes and colors
    let mut sizes = Vec::new();
    for name in ["S", "M", "L", "XL", "XXL"] {
        sizes.push(ctx.catalog.create_size(name).await?);
    }
    let mut colors = Vec::new();
    for (name, hex, image) in [
        ("Black", "#000000", "/images/black.jpg"),
        ("White", "#FFFFFF", "/images/white.jpg"),
        ("Red", "#FF0000", "/images/red.jpg"),
        ("Blue", "#0000FF", "/images/blue.jpg"),
    ] {
        colors.push(ctx.catalog.create_color(name, hex, Some(image)).await?);
    }

    // Design types
    let ai_generated = ctx
        .catalog
        .create_design_type("AI Generated", "Custom designs created using AI")
        .await?;
    let pre_made = ctx
        .catalog
        .create_design_type("Pre-made", "Professionally designed templates")
        .await?;

    let size_ids: Vec<String> = sizes.iter().map(|s| s.id.clone()).collect();
    let color_ids: Vec<String> = colors.iter().map(|c| c.id.clone()).collect();

    // Products
    let specs = [
        (
            "Basic T-Shirt",
            "A comfortable cotton t-shirt perfect for everyday wear",
            1999i64,
            &pre_made,
        ),
        (
            "Premium T-Shirt",
            "High-quality fabric with a tailored fit",
            2999,
            &pre_made,
        ),
        (
            "Custom AI T-Shirt",
            "Create your own design using our AI tools",
            3499,
            &ai_generated,
        ),
    ];

    let mut products = Vec::new();
    for (name, description, price_cents, design_type) in specs {
        let product = ctx
            .catalog
            .create_product(&NewProduct {
                name: name.to_string(),
                description: description.to_string(),
                price_cents,
                design_type_id: Some(design_type.id.clone()),
                size_ids: size_ids.clone(),
                color_ids: color_ids.clone(),
            })
            .await?;
        products.push(product);
    }

    // Stock every cell with a deterministic spread in the 10..=59 range.
    let mut n = 0i64;
    for product in &products {
        for size in &sizes {
            for color in &colors {
                let quantity = 10 + (n * 7) % 50;
                ctx.catalog
                    .set_inventory(&product.id, &size.id, &color.id, quantity)
                    .await?;
                n += 1;
            }
        }
    }

    // Primary images
    for product in &products {
        let label = product.name.replace(' ', "+");
        ctx.catalog
            .add_image(
                &product.id,
                &format!("https://placehold.co/600x800/000000/FFFFFF.png?text={label}"),
                "primary",
                &format!("{} front view", product.name),
            )
            .await?;
    }

    // Demo accounts
    let john_hash = auth::hash_password("password123")?;
    let john = ctx
        .storage
        .create_user("john@example.com", "John Doe", &john_hash, "local", true)
        .await?;
    let jane_hash = auth::hash_password("password123")?;
    let jane = ctx
        .storage
        .create_user("jane@example.com", "Jane Smith", &jane_hash, "local", true)
        .await?;
    ensure_admin(&ctx.storage, "admin@example.com", "admin123", "Admin User").await?;

    ctx.storage
        .create_address(
            &john.id,
            "123 Main St",
            "New York",
            "NY",
            "10001",
            "USA",
            Some("555-123-4567"),
            true,
        )
        .await?;
    ctx.storage
        .create_address(
            &jane.id,
            "456 Park Ave",
            "Los Angeles",
            "CA",
            "90001",
            "USA",
            Some("555-987-6543"),
            true,
        )
        .await?;

    // Sample designs
    ctx.designs
        .create_design(
            &john.id,
            "Mountain landscape with sunset",
            "https://placehold.co/400x400/FF9900/FFFFFF.png?text=Mountain+Design",
            true,
        )
        .await?;
    ctx.designs
        .create_design(
            &john.id,
            "Abstract geometric pattern",
            "https://placehold.co/400x400/9900FF/FFFFFF.png?text=Abstract+Design",
            false,
        )
        .await?;

    info!(
        products = products.len(),
        sizes = sizes.len(),
        colors = colors.len(),
        "demo data seeded"
    );
    Ok(())
}

/// Delete all storefront rows, child tables first.
async fn wipe(ctx: &AppContext) -> Result<()> {
    info!("wiping existing data");
    let pool = ctx.storage.pool();
    for table in [
        "order_items",
        "orders",
        "inventory",
        "product_images",
        "product_sizes",
        "product_colors",
        "products",
        "designs",
        "design_types",
        "colors",
        "sizes",
        "addresses",
        "email_tokens",
        "oauth_states",
        "sessions",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&pool)
            .await?;
    }
    Ok(())
}
