use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed specialty taxonomy. Search filters match against the wire value
/// (`cardiology`, `ent`, ...); anything outside the taxonomy is treated as
/// an absent filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    General,
    Cardiology,
    Dermatology,
    Neurology,
    Orthopedics,
    Ophthalmology,
    Ent,
    Gynecology,
    Pediatrics,
    Psychiatry,
    Respiratory,
    Gastroenterology,
    Endocrinology,
    Urology,
    Oncology,
    Rheumatology,
    Anesthesiology,
    Radiology,
    Pathology,
    Emergency,
}

impl Specialty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "general" => Some(Self::General),
            "cardiology" => Some(Self::Cardiology),
            "dermatology" => Some(Self::Dermatology),
            "neurology" => Some(Self::Neurology),
            "orthopedics" => Some(Self::Orthopedics),
            "ophthalmology" => Some(Self::Ophthalmology),
            "ent" => Some(Self::Ent),
            "gynecology" => Some(Self::Gynecology),
            "pediatrics" => Some(Self::Pediatrics),
            "psychiatry" => Some(Self::Psychiatry),
            "respiratory" => Some(Self::Respiratory),
            "gastroenterology" => Some(Self::Gastroenterology),
            "endocrinology" => Some(Self::Endocrinology),
            "urology" => Some(Self::Urology),
            "oncology" => Some(Self::Oncology),
            "rheumatology" => Some(Self::Rheumatology),
            "anesthesiology" => Some(Self::Anesthesiology),
            "radiology" => Some(Self::Radiology),
            "pathology" => Some(Self::Pathology),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Cardiology => "cardiology",
            Self::Dermatology => "dermatology",
            Self::Neurology => "neurology",
            Self::Orthopedics => "orthopedics",
            Self::Ophthalmology => "ophthalmology",
            Self::Ent => "ent",
            Self::Gynecology => "gynecology",
            Self::Pediatrics => "pediatrics",
            Self::Psychiatry => "psychiatry",
            Self::Respiratory => "respiratory",
            Self::Gastroenterology => "gastroenterology",
            Self::Endocrinology => "endocrinology",
            Self::Urology => "urology",
            Self::Oncology => "oncology",
            Self::Rheumatology => "rheumatology",
            Self::Anesthesiology => "anesthesiology",
            Self::Radiology => "radiology",
            Self::Pathology => "pathology",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: Specialty,
    pub qualification: String,
    pub experience_years: i32,
    pub consultation_fee: f64,
    pub city: String,
    pub state: String,
    pub bio: String,
    pub clinic_name: String,
    pub languages_spoken: String,
    pub hospital_affiliations: String,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub total_patients: i64,
    pub is_available: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub specializations: Vec<DoctorSpecialization>,
    #[serde(default)]
    pub availability_slots: Vec<AvailabilitySlot>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Free-form named sub-skill (e.g. "Interventional Cardiology"), matched by
/// the text search alongside the doctor's own fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSpecialization {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub name: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i32, // 0 = Monday .. 6 = Sunday
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub rating: i32,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

/// One search request's raw filter criteria, exactly as they arrive from
/// the query string. Never persisted; compiled into a `ProviderQuery`
/// before touching the catalog. Unparseable values degrade to "filter not
/// applied" rather than failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub search_query: Option<String>,
    pub min_experience: Option<String>,
    pub max_fee: Option<String>,
    pub rating_min: Option<String>,
    pub language: Option<String>,
    pub verified_only: Option<String>,
    pub availability_day: Option<String>,
    pub sort_by: Option<String>,
}

impl SearchFilters {
    /// Supplied entries as name/value pairs for cache-key derivation.
    /// Absent and empty filters are omitted so that logically identical
    /// searches share a key.
    pub fn cache_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        let fields: [(&'static str, &Option<String>); 11] = [
            ("specialty", &self.specialty),
            ("city", &self.city),
            ("state", &self.state),
            ("search_query", &self.search_query),
            ("min_experience", &self.min_experience),
            ("max_fee", &self.max_fee),
            ("rating_min", &self.rating_min),
            ("language", &self.language),
            ("verified_only", &self.verified_only),
            ("availability_day", &self.availability_day),
            ("sort_by", &self.sort_by),
        ];
        for (name, value) in fields {
            if let Some(value) = value.as_deref() {
                if !value.is_empty() {
                    pairs.push((name, value));
                }
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorStatsUpdate {
    pub id: Uuid,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub total_patients: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WarmUpReport {
    pub featured: usize,
    pub canned_searches: usize,
    pub cities: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsRefreshReport {
    pub providers_updated: usize,
    pub batches: usize,
    pub cache_entries_invalidated: u64,
}
