//! Router-level tests that need no database.
//!
//! Every property here is decided by routing, extractors or the method
//! table before any query runs.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use tower::ServiceExt;

use foodgram_integration_tests::offline_app;

async fn send(
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
        .unwrap();

    let response = offline_app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, headers, json)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let response = offline_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

// =============================================================================
// Full replacement
// =============================================================================

#[tokio::test]
async fn test_put_recipe_is_method_not_allowed() {
    let (status, _, json) = send(Method::PUT, "/api/recipes/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(json["errors"]["detail"].is_array());
}

#[tokio::test]
async fn test_put_ignores_payload() {
    let (status, _, _) = send(
        Method::PUT,
        "/api/recipes/1",
        Some(r#"{"name": "Replaced", "cooking_time": 1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Authentication required
// =============================================================================

#[tokio::test]
async fn test_anonymous_shopping_cart_download_is_unauthorized() {
    let (status, _, json) = send(Method::GET, "/api/recipes/download_shopping_cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["errors"]["detail"].is_array());
}

#[tokio::test]
async fn test_anonymous_toggles_are_unauthorized() {
    for (method, uri) in [
        (Method::POST, "/api/recipes/1/favorite"),
        (Method::DELETE, "/api/recipes/1/favorite"),
        (Method::POST, "/api/recipes/1/shopping_cart"),
        (Method::DELETE, "/api/recipes/1/shopping_cart"),
        (Method::POST, "/api/users/1/subscribe"),
        (Method::DELETE, "/api/users/1/subscribe"),
    ] {
        let (status, _, _) = send(method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_anonymous_writes_are_unauthorized() {
    let (status, _, _) = send(Method::POST, "/api/recipes", Some("{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(Method::PATCH, "/api/recipes/1", Some("{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(Method::GET, "/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Malformed ids
// =============================================================================

#[tokio::test]
async fn test_malformed_path_ids_use_error_shape() {
    for uri in [
        "/api/recipes/abc",
        "/api/tags/abc",
        "/api/ingredients/1.5",
        "/api/users/99999999999",
    ] {
        let (status, _, json) = send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["errors"]["detail"][0].is_string(), "{uri}: {json}");
    }
}

// =============================================================================
// Request ids
// =============================================================================

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let response = offline_app()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "edge-1234")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-1234");
}
