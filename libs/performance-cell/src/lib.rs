// =====================================================================================
// PERFORMANCE CELL - RESULT CACHING
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::create_performance_router;
pub use services::cache::{CacheError, CacheService, CacheStore, InMemoryCacheStore, RedisCacheStore};
