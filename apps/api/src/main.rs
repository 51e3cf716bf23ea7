use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use doctor_cell::handlers::DoctorState;
use doctor_cell::services::{DoctorSearchService, StatsRefreshService, SupabaseCatalog};
use performance_cell::services::{CacheService, CacheStore, InMemoryCacheStore, RedisCacheStore};
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting WellCare API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // Wire the cache store; a missing or unreachable Redis degrades to the
    // in-process store rather than blocking startup
    let store: Arc<dyn CacheStore> = match config.redis_url.as_deref() {
        Some(redis_url) => match RedisCacheStore::new(redis_url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Redis unavailable ({}), using in-process cache store", e);
                Arc::new(InMemoryCacheStore::new())
            }
        },
        None => Arc::new(InMemoryCacheStore::new()),
    };
    let cache = Arc::new(CacheService::new(store));

    // Wire the catalog and the services on top of it
    let catalog = Arc::new(SupabaseCatalog::new(&config));
    let doctor_state = DoctorState {
        config: config.clone(),
        search: Arc::new(DoctorSearchService::new(catalog.clone(), cache.clone())),
        stats: Arc::new(StatsRefreshService::new(catalog, cache.clone())),
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(config, doctor_state, cache)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
