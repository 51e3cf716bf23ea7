use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::{Doctor, SearchFilters, Specialty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Default order. Currently identical to `Rating` whether or not a text
    /// search is active; true relevance scoring is a known gap.
    #[default]
    Relevance,
    Rating,
    Experience,
    FeeLow,
    FeeHigh,
    Reviews,
    Newest,
    Name,
}

impl SortOrder {
    /// Unrecognized names fall back to the default order rather than
    /// erroring, matching the filter-degradation rules.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("rating") => Self::Rating,
            Some("experience") => Self::Experience,
            Some("fee_low") => Self::FeeLow,
            Some("fee_high") => Self::FeeHigh,
            Some("reviews") => Self::Reviews,
            Some("newest") => Self::Newest,
            Some("name") => Self::Name,
            _ => Self::Relevance,
        }
    }
}

/// A compiled filter set: one search request's criteria with the raw query
/// string values parsed, combined with logical AND, restricted to available
/// doctors. Malformed numeric or enumerated values compile to `None` and
/// constrain nothing.
#[derive(Debug, Clone, Default)]
pub struct ProviderQuery {
    pub specialty: Option<Specialty>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub search_query: Option<String>,
    pub min_experience: Option<i32>,
    pub max_fee: Option<f64>,
    pub min_rating: Option<f64>,
    pub language: Option<String>,
    pub verified_only: bool,
    pub availability_day: Option<i32>,
    pub sort: SortOrder,
}

impl ProviderQuery {
    pub fn from_filters(filters: &SearchFilters) -> Self {
        Self {
            specialty: filters.specialty.as_deref().and_then(Specialty::parse),
            city: non_empty(&filters.city),
            state: non_empty(&filters.state),
            search_query: non_empty(&filters.search_query),
            min_experience: parse_numeric(&filters.min_experience),
            max_fee: parse_numeric(&filters.max_fee),
            min_rating: parse_numeric(&filters.rating_min),
            language: non_empty(&filters.language),
            // Presence of any non-empty value applies the filter
            verified_only: filters
                .verified_only
                .as_deref()
                .is_some_and(|v| !v.is_empty()),
            availability_day: parse_numeric(&filters.availability_day),
            sort: SortOrder::parse(filters.sort_by.as_deref()),
        }
    }

    /// Whether `doctor` satisfies every supplied filter. A single
    /// evaluation per doctor means multi-field text matches cannot produce
    /// duplicates.
    pub fn matches(&self, doctor: &Doctor) -> bool {
        if !doctor.is_available {
            return false;
        }
        if let Some(specialty) = self.specialty {
            if doctor.specialty != specialty {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if !contains_ci(&doctor.city, city) {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if !contains_ci(&doctor.state, state) {
                return false;
            }
        }
        if let Some(query) = &self.search_query {
            if !self.matches_text(doctor, query) {
                return false;
            }
        }
        if let Some(min_experience) = self.min_experience {
            if doctor.experience_years < min_experience {
                return false;
            }
        }
        if let Some(max_fee) = self.max_fee {
            if doctor.consultation_fee > max_fee {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if doctor.average_rating < min_rating {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if !contains_ci(&doctor.languages_spoken, language) {
                return false;
            }
        }
        if self.verified_only && !doctor.is_verified {
            return false;
        }
        if let Some(day) = self.availability_day {
            let has_slot = doctor
                .availability_slots
                .iter()
                .any(|slot| slot.is_active && slot.day_of_week == day);
            if !has_slot {
                return false;
            }
        }
        true
    }

    /// Case-insensitive substring match over any of the doctor's textual
    /// fields or specialization names.
    fn matches_text(&self, doctor: &Doctor, query: &str) -> bool {
        contains_ci(&doctor.first_name, query)
            || contains_ci(&doctor.last_name, query)
            || contains_ci(&doctor.qualification, query)
            || contains_ci(&doctor.bio, query)
            || contains_ci(&doctor.clinic_name, query)
            || contains_ci(&doctor.hospital_affiliations, query)
            || doctor
                .specializations
                .iter()
                .any(|s| contains_ci(&s.name, query))
    }

    /// Order `doctors` by the selected sort. Every order tie-breaks on id,
    /// so identical queries return identical sequences.
    pub fn order(&self, doctors: &mut [Doctor]) {
        doctors.sort_by(|a, b| self.compare(a, b).then_with(|| a.id.cmp(&b.id)));
    }

    fn compare(&self, a: &Doctor, b: &Doctor) -> Ordering {
        match self.sort {
            SortOrder::Relevance | SortOrder::Rating => b
                .average_rating
                .total_cmp(&a.average_rating)
                .then(b.total_reviews.cmp(&a.total_reviews)),
            SortOrder::Experience => b.experience_years.cmp(&a.experience_years),
            SortOrder::FeeLow => a.consultation_fee.total_cmp(&b.consultation_fee),
            SortOrder::FeeHigh => b.consultation_fee.total_cmp(&a.consultation_fee),
            SortOrder::Reviews => b.total_reviews.cmp(&a.total_reviews),
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Name => a
                .first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name)),
        }
    }

    /// Filter then sort: the ordered result of this query over `doctors`.
    pub fn apply(&self, mut doctors: Vec<Doctor>) -> Vec<Doctor> {
        doctors.retain(|doctor| self.matches(doctor));
        self.order(&mut doctors);
        doctors
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_numeric<T: FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|raw| raw.trim().parse().ok())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_name_falls_back_to_relevance() {
        assert_eq!(SortOrder::parse(Some("cheapest")), SortOrder::Relevance);
        assert_eq!(SortOrder::parse(None), SortOrder::Relevance);
        assert_eq!(SortOrder::parse(Some("fee_low")), SortOrder::FeeLow);
    }

    #[test]
    fn numeric_parsing_ignores_garbage_and_trims() {
        assert_eq!(parse_numeric::<i32>(&Some("10".to_string())), Some(10));
        assert_eq!(parse_numeric::<i32>(&Some(" 10 ".to_string())), Some(10));
        assert_eq!(parse_numeric::<i32>(&Some("abc".to_string())), None);
        assert_eq!(parse_numeric::<f64>(&Some("4.5".to_string())), Some(4.5));
        assert_eq!(parse_numeric::<f64>(&None), None);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        assert!(contains_ci("New Delhi", "delhi"));
        assert!(contains_ci("Hindi, English", "ENGLISH"));
        assert!(!contains_ci("Mumbai", "Delhi"));
    }

    #[test]
    fn verified_only_follows_raw_truthiness() {
        let mut filters = SearchFilters::default();
        assert!(!ProviderQuery::from_filters(&filters).verified_only);

        filters.verified_only = Some("on".to_string());
        assert!(ProviderQuery::from_filters(&filters).verified_only);

        filters.verified_only = Some(String::new());
        assert!(!ProviderQuery::from_filters(&filters).verified_only);
    }
}
