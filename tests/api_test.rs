//! End-to-end tests over the axum router: envelope shape, auth guards,
//! and the register → login → me flow, without binding a socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use stitchd::config::StoreConfig;
use stitchd::storage::Storage;
use stitchd::AppContext;

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn test_router() -> (Router, AppContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(None, Some(dir.path().to_path_buf()), None, None);
    let storage = Storage::new(dir.path()).await.unwrap();
    let ctx = AppContext::new(config, storage).unwrap();
    let router = stitchd::rest::build_router(std::sync::Arc::new(ctx.clone()));
    (router, ctx, dir)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── Health + metrics ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint_answers() {
    let (router, _ctx, _dir) = test_router().await;
    let response = router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let (router, _ctx, _dir) = test_router().await;
    let response = router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("stitchd_http_requests_total"));
}

// ─── Register → login → me ────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_me_flow() {
    let (router, _ctx, _dir) = test_router().await;

    // Register
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            json!({ "name": "Jane Smith", "email": "jane@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "jane@example.com");
    // The hash never leaves the server.
    assert!(body["data"]["user"].get("password_hash").is_none());

    // Duplicate email
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            json!({ "name": "Jane Again", "email": "jane@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email already in use");

    // Login
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "jane@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 32);

    // Wrong password gets the same message as unknown email.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "jane@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_pw = body_json(response).await;
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "nobody@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    let unknown = body_json(response).await;
    assert_eq!(wrong_pw["error"], unknown["error"]);

    // Me
    let response = router
        .clone()
        .oneshot(get_authed("/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["name"], "Jane Smith");

    // Me without a token
    let response = router.clone().oneshot(get("/api/auth/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validation_errors_come_back_as_a_field_map() {
    let (router, _ctx, _dir) = test_router().await;

    let response = router
        .oneshot(post_json(
            "/api/auth/register",
            json!({ "name": "J", "email": "not-an-email", "password": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation error");
    assert!(body["errors"]["name"].is_string());
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
}

// ─── Admin guard ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let (router, ctx, _dir) = test_router().await;

    // Anonymous: 401.
    let response = router
        .clone()
        .oneshot(get("/api/admin/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Regular user: 403.
    let hash = stitchd::auth::hash_password("password123").unwrap();
    let user = ctx
        .storage
        .create_user("pleb@example.com", "Pleb", &hash, "local", true)
        .await
        .unwrap();
    let token = stitchd::auth::issue_session(&ctx.storage, &user.id, 7)
        .await
        .unwrap();
    let response = router
        .clone()
        .oneshot(get_authed("/api/admin/summary", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin: 200.
    let admin = stitchd::seed::ensure_admin(&ctx.storage, "boss@example.com", "admin123", "Boss")
        .await
        .unwrap();
    let token = stitchd::auth::issue_session(&ctx.storage, &admin.id, 7)
        .await
        .unwrap();
    let response = router
        .clone()
        .oneshot(get_authed("/api/admin/summary", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["users"], 2);
}

// ─── Public catalog surface ───────────────────────────────────────────────────

#[tokio::test]
async fn product_listing_is_public_and_paginated() {
    let (router, ctx, _dir) = test_router().await;

    let size = ctx.catalog.create_size("M").await.unwrap();
    let color = ctx.catalog.create_color("Black", "#000000", None).await.unwrap();
    ctx.catalog
        .create_product(&stitchd::catalog::NewProduct {
            name: "Basic T-Shirt".to_string(),
            description: "A comfortable cotton t-shirt".to_string(),
            price_cents: 1999,
            design_type_id: None,
            size_ids: vec![size.id],
            color_ids: vec![color.id],
        })
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(get("/api/products?search=basic"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["pagination"]["total_items"], 1);
    assert_eq!(body["data"]["products"][0]["name"], "Basic T-Shirt");
    assert_eq!(body["data"]["products"][0]["price_cents"], 1999);

    // Creating products needs an admin session.
    let response = router
        .oneshot(post_json("/api/products", json!({ "name": "Rogue" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
