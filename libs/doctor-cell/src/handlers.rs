use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::SearchFilters;
use crate::services::search::{DoctorSearchService, DEFAULT_FEATURED_LIMIT};
use crate::services::stats::StatsRefreshService;

/// Shared state for the doctor routes. Catalog and cache are injected at
/// startup; handlers stay stateless.
#[derive(Clone)]
pub struct DoctorState {
    pub config: Arc<AppConfig>,
    pub search: Arc<DoctorSearchService>,
    pub stats: Arc<StatsRefreshService>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<usize>,
}

/// Public doctor search. Every filter is optional and malformed values
/// degrade to "not applied", so a partially invalid query string returns
/// whatever the valid subset produces rather than an error.
#[axum::debug_handler]
pub async fn search_doctors(
    State(state): State<DoctorState>,
    Query(filters): Query<SearchFilters>,
) -> Result<Json<Value>, AppError> {
    let doctors = state
        .search
        .search(&filters)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn featured_doctors(
    State(state): State<DoctorState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    let doctors = state
        .search
        .featured(limit)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn city_counts(State(state): State<DoctorState>) -> Result<Json<Value>, AppError> {
    let cities = state
        .search
        .city_counts()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "cities": cities })))
}

#[axum::debug_handler]
pub async fn warm_up_cache(State(state): State<DoctorState>) -> Result<Json<Value>, AppError> {
    let report = state
        .search
        .warm_up()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(report)))
}

/// The maintenance entry point: recompute statistics, then re-warm the
/// caches the refresh just invalidated.
#[axum::debug_handler]
pub async fn refresh_statistics(State(state): State<DoctorState>) -> Result<Json<Value>, AppError> {
    let refresh = state
        .stats
        .refresh_all()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let warm_up = state
        .search
        .warm_up()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "refresh": refresh,
        "warm_up": warm_up
    })))
}
