use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use performance_cell::services::CacheService;

use crate::models::{CityCount, Doctor, SearchFilters, WarmUpReport};
use crate::query::{ProviderQuery, SortOrder};
use crate::services::catalog::DoctorCatalog;

/// Featured and aggregate panels change slowly; search results track the
/// statistics refresh more closely.
pub const FEATURED_TTL: Duration = Duration::from_secs(3600);
pub const SEARCH_TTL: Duration = Duration::from_secs(900);
pub const CITY_COUNTS_TTL: Duration = Duration::from_secs(3600);

pub const FEATURED_MIN_RATING: f64 = 4.0;
pub const FEATURED_MIN_REVIEWS: i64 = 5;
pub const DEFAULT_FEATURED_LIMIT: usize = 6;

const CITY_COUNTS_KEY: &str = "doctor_count_by_city";
const CITY_COUNTS_LIMIT: usize = 20;

/// Filter combinations popular enough to pre-warm. Warmed through the
/// regular search path, so the populated keys are exactly the keys
/// request traffic hits.
const POPULAR_SPECIALTIES: [&str; 4] = ["cardiology", "general", "pediatrics", "dermatology"];

/// Doctor search with result memoization in front of the catalog.
pub struct DoctorSearchService {
    catalog: Arc<dyn DoctorCatalog>,
    cache: Arc<CacheService>,
}

impl DoctorSearchService {
    pub fn new(catalog: Arc<dyn DoctorCatalog>, cache: Arc<CacheService>) -> Self {
        Self { catalog, cache }
    }

    /// Stable digest of the filter set, invariant to the order filters
    /// were supplied in.
    pub fn search_cache_key(filters: &SearchFilters) -> String {
        CacheService::cache_key("doctor_search", &filters.cache_pairs())
    }

    pub async fn search(&self, filters: &SearchFilters) -> Result<Vec<Doctor>> {
        debug!("Searching doctors with filters: {:?}", filters);

        let query = ProviderQuery::from_filters(filters);
        let key = Self::search_cache_key(filters);

        self.cache
            .get_or_compute(&key, SEARCH_TTL, || async move {
                self.catalog
                    .search(&query)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await
    }

    /// Highest-rated doctors with an established review history.
    pub async fn featured(&self, limit: usize) -> Result<Vec<Doctor>> {
        let key = format!("featured_doctors_{}", limit);

        self.cache
            .get_or_compute(&key, FEATURED_TTL, || async move {
                let query = ProviderQuery {
                    min_rating: Some(FEATURED_MIN_RATING),
                    sort: SortOrder::Rating,
                    ..ProviderQuery::default()
                };
                let mut doctors = self.catalog.search(&query).await?;
                doctors.retain(|doctor| doctor.total_reviews >= FEATURED_MIN_REVIEWS);
                doctors.truncate(limit);
                Ok(doctors)
            })
            .await
    }

    pub async fn city_counts(&self) -> Result<Vec<CityCount>> {
        self.cache
            .get_or_compute(CITY_COUNTS_KEY, CITY_COUNTS_TTL, || async move {
                self.catalog
                    .count_by_city(CITY_COUNTS_LIMIT)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await
    }

    /// Populate the high-traffic keys ahead of request traffic. Runs from
    /// the admin surface or a scheduled job, never on the request path.
    pub async fn warm_up(&self) -> Result<WarmUpReport> {
        info!("Warming up search caches");

        let featured = self.featured(DEFAULT_FEATURED_LIMIT).await?.len();

        for specialty in POPULAR_SPECIALTIES {
            let filters = SearchFilters {
                specialty: Some(specialty.to_string()),
                ..SearchFilters::default()
            };
            self.search(&filters).await?;
        }

        let cities = self.city_counts().await?.len();

        info!("Cache warm-up completed");
        Ok(WarmUpReport {
            featured,
            canned_searches: POPULAR_SPECIALTIES.len(),
            cities,
        })
    }
}
