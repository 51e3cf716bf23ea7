use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, CityCount, Doctor, DoctorStatsUpdate, Review, ReviewSummary,
};
use crate::query::ProviderQuery;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog query failed: {0}")]
    Query(String),

    #[error("Malformed catalog row: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The provider catalog: a filterable, sortable collection of doctors plus
/// the review/appointment aggregates the statistics refresh needs. Search
/// is read-only; `update_statistics` is the single write path.
#[async_trait]
pub trait DoctorCatalog: Send + Sync {
    /// Ordered doctors satisfying `query`, available providers only.
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Doctor>, CatalogError>;

    /// Available-provider counts per city, busiest cities first.
    async fn count_by_city(&self, limit: usize) -> Result<Vec<CityCount>, CatalogError>;

    /// Stable id-ordered page over all providers, for batch jobs.
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<Doctor>, CatalogError>;

    /// Average rating and count over approved reviews.
    async fn review_summary(&self, doctor_id: Uuid) -> Result<ReviewSummary, CatalogError>;

    async fn distinct_patient_count(&self, doctor_id: Uuid) -> Result<i64, CatalogError>;

    /// Persist recomputed statistics as one batched write.
    async fn update_statistics(&self, updates: &[DoctorStatsUpdate]) -> Result<(), CatalogError>;
}

const EMBED_SELECT: &str = "select=*,specializations(*),availability_slots(*)";

pub struct SupabaseCatalog {
    supabase: SupabaseClient,
    service_role_key: Option<String>,
}

impl SupabaseCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    async fn fetch_doctors(&self, path: &str) -> Result<Vec<Doctor>, CatalogError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None, None)
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(CatalogError::from)
    }
}

#[async_trait]
impl DoctorCatalog for SupabaseCatalog {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Doctor>, CatalogError> {
        let mut query_parts = vec![EMBED_SELECT.to_string(), "is_available=eq.true".to_string()];

        // Indexable constraints are pushed down; substring and slot filters
        // plus ordering are applied in-process over the fetched rows so
        // that every backend agrees with the in-memory reference.
        if let Some(specialty) = query.specialty {
            query_parts.push(format!("specialty=eq.{}", specialty));
        }
        if let Some(min_experience) = query.min_experience {
            query_parts.push(format!("experience_years=gte.{}", min_experience));
        }
        if let Some(max_fee) = query.max_fee {
            query_parts.push(format!("consultation_fee=lte.{}", max_fee));
        }
        if let Some(min_rating) = query.min_rating {
            query_parts.push(format!("average_rating=gte.{}", min_rating));
        }
        if query.verified_only {
            query_parts.push("is_verified=eq.true".to_string());
        }

        let path = format!("/rest/v1/doctors?{}", query_parts.join("&"));
        debug!("Catalog search: {}", path);

        let doctors = self.fetch_doctors(&path).await?;
        Ok(query.apply(doctors))
    }

    async fn count_by_city(&self, limit: usize) -> Result<Vec<CityCount>, CatalogError> {
        let rows: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/doctors?select=city&is_available=eq.true",
                None,
                None,
            )
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in rows {
            if let Some(city) = row["city"].as_str() {
                *counts.entry(city.to_string()).or_insert(0) += 1;
            }
        }

        Ok(rank_cities(counts, limit))
    }

    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<Doctor>, CatalogError> {
        let path = format!(
            "/rest/v1/doctors?{}&order=id.asc&offset={}&limit={}",
            EMBED_SELECT, offset, limit
        );
        self.fetch_doctors(&path).await
    }

    async fn review_summary(&self, doctor_id: Uuid) -> Result<ReviewSummary, CatalogError> {
        let path = format!(
            "/rest/v1/reviews?select=rating&doctor_id=eq.{}&is_approved=eq.true",
            doctor_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        let ratings: Vec<i64> = rows.iter().filter_map(|row| row["rating"].as_i64()).collect();
        Ok(summarize_ratings(&ratings))
    }

    async fn distinct_patient_count(&self, doctor_id: Uuid) -> Result<i64, CatalogError> {
        let path = format!(
            "/rest/v1/appointments?select=patient_id&doctor_id=eq.{}",
            doctor_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        let patients: HashSet<&str> = rows
            .iter()
            .filter_map(|row| row["patient_id"].as_str())
            .collect();
        Ok(patients.len() as i64)
    }

    async fn update_statistics(&self, updates: &[DoctorStatsUpdate]) -> Result<(), CatalogError> {
        if updates.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let body: Vec<Value> = updates
            .iter()
            .map(|update| {
                json!({
                    "id": update.id,
                    "average_rating": update.average_rating,
                    "total_reviews": update.total_reviews,
                    "total_patients": update.total_patients,
                    "updated_at": now,
                })
            })
            .collect();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors?on_conflict=id",
                self.service_role_key.as_deref(),
                Some(Value::Array(body)),
                Some(headers),
            )
            .await
            .map_err(|e| CatalogError::Query(e.to_string()))?;

        Ok(())
    }
}

/// Process-local catalog: the semantic reference for `ProviderQuery` and
/// the substitute for Supabase in tests.
#[derive(Default)]
pub struct InMemoryCatalog {
    doctors: RwLock<Vec<Doctor>>,
    reviews: RwLock<Vec<Review>>,
    appointments: RwLock<Vec<Appointment>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_doctor(&self, doctor: Doctor) {
        self.doctors.write().await.push(doctor);
    }

    pub async fn insert_review(&self, review: Review) {
        self.reviews.write().await.push(review);
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.appointments.write().await.push(appointment);
    }

    pub async fn get_doctor(&self, id: Uuid) -> Option<Doctor> {
        self.doctors
            .read()
            .await
            .iter()
            .find(|doctor| doctor.id == id)
            .cloned()
    }
}

#[async_trait]
impl DoctorCatalog for InMemoryCatalog {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Doctor>, CatalogError> {
        let doctors = self.doctors.read().await.clone();
        Ok(query.apply(doctors))
    }

    async fn count_by_city(&self, limit: usize) -> Result<Vec<CityCount>, CatalogError> {
        let doctors = self.doctors.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for doctor in doctors.iter().filter(|d| d.is_available) {
            *counts.entry(doctor.city.clone()).or_insert(0) += 1;
        }
        Ok(rank_cities(counts, limit))
    }

    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<Doctor>, CatalogError> {
        let mut doctors = self.doctors.read().await.clone();
        doctors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(doctors.into_iter().skip(offset).take(limit).collect())
    }

    async fn review_summary(&self, doctor_id: Uuid) -> Result<ReviewSummary, CatalogError> {
        let reviews = self.reviews.read().await;
        let ratings: Vec<i64> = reviews
            .iter()
            .filter(|review| review.doctor_id == doctor_id && review.is_approved)
            .map(|review| review.rating as i64)
            .collect();
        Ok(summarize_ratings(&ratings))
    }

    async fn distinct_patient_count(&self, doctor_id: Uuid) -> Result<i64, CatalogError> {
        let appointments = self.appointments.read().await;
        let patients: HashSet<Uuid> = appointments
            .iter()
            .filter(|appointment| appointment.doctor_id == doctor_id)
            .map(|appointment| appointment.patient_id)
            .collect();
        Ok(patients.len() as i64)
    }

    async fn update_statistics(&self, updates: &[DoctorStatsUpdate]) -> Result<(), CatalogError> {
        let mut doctors = self.doctors.write().await;
        for update in updates {
            if let Some(doctor) = doctors.iter_mut().find(|d| d.id == update.id) {
                doctor.average_rating = update.average_rating;
                doctor.total_reviews = update.total_reviews;
                doctor.total_patients = update.total_patients;
                doctor.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

fn rank_cities(counts: HashMap<String, i64>, limit: usize) -> Vec<CityCount> {
    let mut ranked: Vec<CityCount> = counts
        .into_iter()
        .map(|(city, count)| CityCount { city, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    ranked.truncate(limit);
    ranked
}

fn summarize_ratings(ratings: &[i64]) -> ReviewSummary {
    let review_count = ratings.len() as i64;
    let average_rating = if review_count > 0 {
        ratings.iter().sum::<i64>() as f64 / review_count as f64
    } else {
        0.0
    };
    ReviewSummary {
        average_rating,
        review_count,
    }
}
