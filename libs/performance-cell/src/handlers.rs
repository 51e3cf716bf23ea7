use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{CacheStats, InvalidateRequest, InvalidateResponse};
use crate::services::CacheService;

#[axum::debug_handler]
pub async fn get_cache_stats(
    State(cache): State<Arc<CacheService>>,
) -> Result<Json<CacheStats>, AppError> {
    let stats = cache
        .stats()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(stats))
}

/// Explicit removal of a single key or a whole key family, used after a
/// write makes cached entries stale ahead of their TTL.
#[axum::debug_handler]
pub async fn invalidate_cache(
    State(cache): State<Arc<CacheService>>,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let removed = match (request.key, request.prefix) {
        (Some(key), _) => {
            cache
                .invalidate(&key)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            1
        }
        (None, Some(prefix)) => cache
            .invalidate_prefix(&prefix)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either 'key' or 'prefix' is required".to_string(),
            ));
        }
    };

    Ok(Json(InvalidateResponse { removed }))
}

#[axum::debug_handler]
pub async fn clear_cache(State(cache): State<Arc<CacheService>>) -> Result<Json<Value>, AppError> {
    cache
        .clear()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "cleared": true })))
}
