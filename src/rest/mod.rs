// rest/mod.rs — Public storefront HTTP API.
//
// Axum JSON API served on {bind_address}:{port}. All responses use the
// uniform `{ "success": bool, "data"?, "error"?, "errors"? }` envelope.
//
// Endpoints:
//   GET  /api/health
//   GET  /metrics                                (Prometheus text)
//   POST /api/auth/register | login | logout
//   GET  /api/auth/me
//   POST /api/auth/verify-email   GET /api/auth/verify-email?token=
//   GET  /api/auth/google         GET /api/auth/google/callback
//   GET  /api/products            POST /api/products            (admin)
//   GET  /api/products/{id}       PUT  /api/products/{id}       (admin)
//   POST /api/products/{id}/images                              (admin)
//   DELETE /api/products/{id}/images/{image_id}                 (admin)
//   GET  /api/catalog/options
//   GET|POST /api/addresses       DELETE /api/addresses/{id}
//   GET|POST /api/orders          GET|PUT /api/orders/{id}
//   GET|POST /api/designs         GET /api/designs/public
//   DELETE /api/designs/{id}
//   GET  /api/admin/summary | users | orders                    (admin)
//   PUT  /api/admin/orders/{id} | /api/admin/inventory          (admin)
//   GET  /api/admin/inventory/low                               (admin)

pub mod auth;
pub mod error;
pub mod response;
pub mod routes;

use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::AppContext;

pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("storefront API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to install ctrl-c handler: {e}");
    }
    info!("shutdown signal received");
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(ctx.config.cors_origin.as_deref());

    Router::new()
        // Health + metrics (no auth)
        .route("/api/health", get(routes::health::health))
        .route("/metrics", get(routes::metrics::metrics))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/auth/verify-email",
            post(routes::auth::request_verification).get(routes::auth::confirm_verification),
        )
        .route("/api/auth/google", get(routes::auth::google_start))
        .route(
            "/api/auth/google/callback",
            get(routes::auth::google_callback),
        )
        // Catalog
        .route(
            "/api/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(routes::products::get_product).put(routes::products::update_product),
        )
        .route(
            "/api/products/{id}/images",
            post(routes::products::add_image),
        )
        .route(
            "/api/products/{id}/images/{image_id}",
            delete(routes::products::delete_image),
        )
        .route("/api/catalog/options", get(routes::products::catalog_options))
        // Addresses
        .route(
            "/api/addresses",
            get(routes::addresses::list_addresses).post(routes::addresses::create_address),
        )
        .route(
            "/api/addresses/{id}",
            delete(routes::addresses::delete_address),
        )
        // Orders
        .route(
            "/api/orders",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route(
            "/api/orders/{id}",
            get(routes::orders::get_order).put(routes::orders::update_order),
        )
        // Designs
        .route(
            "/api/designs",
            get(routes::designs::list_designs).post(routes::designs::create_design),
        )
        .route("/api/designs/public", get(routes::designs::public_designs))
        .route("/api/designs/{id}", delete(routes::designs::delete_design))
        // Admin
        .route("/api/admin/summary", get(routes::admin::summary))
        .route("/api/admin/users", get(routes::admin::list_users))
        .route("/api/admin/orders", get(routes::admin::list_orders))
        .route("/api/admin/orders/{id}", put(routes::admin::update_order))
        .route("/api/admin/inventory", put(routes::admin::set_inventory))
        .route("/api/admin/inventory/low", get(routes::admin::low_stock))
        .layer(middleware::from_fn_with_state(ctx.clone(), count_requests))
        .layer(cors)
        .with_state(ctx)
}

/// Exact-origin CORS when configured, permissive otherwise (development).
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

async fn count_requests(
    State(ctx): State<Arc<AppContext>>,
    req: Request,
    next: Next,
) -> Response {
    ctx.metrics.inc_http_requests();
    next.run(req).await
}
