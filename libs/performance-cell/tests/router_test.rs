// libs/performance-cell/tests/router_test.rs
// Maintenance endpoints sit behind the admin gate.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use performance_cell::router::create_performance_router;
use performance_cell::services::{CacheService, InMemoryCacheStore};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn cache_service() -> Arc<CacheService> {
    Arc::new(CacheService::new(Arc::new(InMemoryCacheStore::new())))
}

fn admin_token(test_config: &TestConfig) -> String {
    let admin = TestUser::admin("ops@example.com");
    JwtTestUtils::create_test_token(&admin, &test_config.jwt_secret, None)
}

#[tokio::test]
async fn stats_requires_an_admin_token() {
    let test_config = TestConfig::default();
    let app = create_performance_router(test_config.to_arc(), cache_service());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stats_reports_hits_and_entries() {
    let test_config = TestConfig::default();
    let cache = cache_service();

    let _: u32 = cache
        .get_or_compute("doctor_search_ab", Duration::from_secs(60), || async {
            Ok(1)
        })
        .await
        .unwrap();

    let app = create_performance_router(test_config.to_arc(), cache);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .header(
                    "Authorization",
                    format!("Bearer {}", admin_token(&test_config)),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["misses"], 1);
    assert_eq!(payload["total_entries"], 1);
}

#[tokio::test]
async fn invalidate_removes_a_key_family() {
    let test_config = TestConfig::default();
    let cache = cache_service();

    for key in ["doctor_search_ab", "doctor_search_cd", "featured_doctors_6"] {
        let _: u32 = cache
            .get_or_compute(key, Duration::from_secs(60), || async { Ok(1) })
            .await
            .unwrap();
    }

    let app = create_performance_router(test_config.to_arc(), cache.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/invalidate")
                .header("Content-Type", "application/json")
                .header(
                    "Authorization",
                    format!("Bearer {}", admin_token(&test_config)),
                )
                .body(Body::from(
                    json!({ "prefix": "doctor_search_" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["removed"], 2);
    assert_eq!(cache.stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn invalidate_without_a_target_is_a_bad_request() {
    let test_config = TestConfig::default();
    let app = create_performance_router(test_config.to_arc(), cache_service());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/invalidate")
                .header("Content-Type", "application/json")
                .header(
                    "Authorization",
                    format!("Bearer {}", admin_token(&test_config)),
                )
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
