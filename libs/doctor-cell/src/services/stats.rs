use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use performance_cell::services::CacheService;

use crate::models::{DoctorStatsUpdate, StatsRefreshReport};
use crate::services::catalog::DoctorCatalog;

const REFRESH_BATCH_SIZE: usize = 100;

/// Key families whose entries embed doctor statistics.
const STALE_AFTER_REFRESH: [&str; 3] =
    ["doctor_search_", "featured_doctors_", "doctor_count_by_city"];

/// Batch recomputation of per-doctor statistics from reviews and
/// appointments. Runs out-of-band; request handlers never wait on it.
pub struct StatsRefreshService {
    catalog: Arc<dyn DoctorCatalog>,
    cache: Arc<CacheService>,
}

impl StatsRefreshService {
    pub fn new(catalog: Arc<dyn DoctorCatalog>, cache: Arc<CacheService>) -> Self {
        Self { catalog, cache }
    }

    /// Recompute average rating, review count, and distinct patient count
    /// for every doctor, one bounded batch at a time, each batch persisted
    /// as a single bulk write. An interrupted run leaves earlier batches
    /// durable and later doctors stale-but-valid; the next run repairs
    /// the tail.
    pub async fn refresh_all(&self) -> Result<StatsRefreshReport> {
        info!("Updating doctor statistics");

        let mut offset = 0;
        let mut providers_updated = 0;
        let mut batches = 0;

        loop {
            let page = self.catalog.list_page(offset, REFRESH_BATCH_SIZE).await?;
            if page.is_empty() {
                break;
            }

            let mut updates = Vec::with_capacity(page.len());
            for doctor in &page {
                let reviews = self.catalog.review_summary(doctor.id).await?;
                let patients = self.catalog.distinct_patient_count(doctor.id).await?;
                updates.push(DoctorStatsUpdate {
                    id: doctor.id,
                    average_rating: reviews.average_rating,
                    total_reviews: reviews.review_count,
                    total_patients: patients,
                });
            }

            self.catalog.update_statistics(&updates).await?;
            providers_updated += updates.len();
            batches += 1;
            info!("Updated statistics for {} doctors", providers_updated);

            if page.len() < REFRESH_BATCH_SIZE {
                break;
            }
            offset += REFRESH_BATCH_SIZE;
        }

        let cache_entries_invalidated = self.invalidate_stale_entries().await;

        Ok(StatsRefreshReport {
            providers_updated,
            batches,
            cache_entries_invalidated,
        })
    }

    /// Drop cached results that embed the old statistics. Invalidation
    /// failures degrade to TTL expiry rather than failing the refresh.
    async fn invalidate_stale_entries(&self) -> u64 {
        let mut invalidated = 0;
        for prefix in STALE_AFTER_REFRESH {
            match self.cache.invalidate_prefix(prefix).await {
                Ok(removed) => invalidated += removed,
                Err(e) => warn!(
                    "Post-refresh invalidation of {} failed, entries expire by TTL: {}",
                    prefix, e
                ),
            }
        }
        invalidated
    }
}
