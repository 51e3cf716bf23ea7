use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::admin_middleware;

use crate::handlers::{self, DoctorState};

pub fn doctor_routes(state: DoctorState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/search", get(handlers::search_doctors))
        .route("/featured", get(handlers::featured_doctors))
        .route("/stats/cities", get(handlers::city_counts));

    // Maintenance routes (admin only)
    let admin_routes = Router::new()
        .route("/admin/warm-up", post(handlers::warm_up_cache))
        .route("/admin/refresh-stats", post(handlers::refresh_statistics))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            admin_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
