use std::sync::Arc;

use axum::{routing::get, Router};

use doctor_cell::handlers::DoctorState;
use doctor_cell::router::doctor_routes;
use performance_cell::router::create_performance_router;
use performance_cell::services::CacheService;
use shared_config::AppConfig;

pub fn create_router(
    config: Arc<AppConfig>,
    doctor_state: DoctorState,
    cache: Arc<CacheService>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "WellCare API is running!" }))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/performance", create_performance_router(config, cache))
}
