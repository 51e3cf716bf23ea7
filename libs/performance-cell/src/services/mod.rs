pub mod cache;

pub use cache::{CacheError, CacheService, CacheStore, InMemoryCacheStore, RedisCacheStore};
