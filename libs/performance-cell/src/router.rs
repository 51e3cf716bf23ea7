use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::admin_middleware;

use crate::handlers;
use crate::services::CacheService;

/// Cache maintenance surface. Everything here mutates or inspects shared
/// state, so the whole router sits behind the admin gate.
pub fn create_performance_router(config: Arc<AppConfig>, cache: Arc<CacheService>) -> Router {
    Router::new()
        .route("/stats", get(handlers::get_cache_stats))
        .route("/invalidate", post(handlers::invalidate_cache))
        .route("/clear", post(handlers::clear_cache))
        .layer(middleware::from_fn_with_state(config, admin_middleware))
        .with_state(cache)
}
