// libs/doctor-cell/tests/query_test.rs
// Filter and ordering semantics of the provider query builder.

use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use doctor_cell::models::*;
use doctor_cell::query::ProviderQuery;

fn doctor(first_name: &str, specialty: Specialty) -> Doctor {
    Doctor {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: "Rao".to_string(),
        email: format!("{}@wellcare.example", first_name.to_lowercase()),
        specialty,
        qualification: "MBBS, MD".to_string(),
        experience_years: 10,
        consultation_fee: 500.0,
        city: "Delhi".to_string(),
        state: "Delhi".to_string(),
        bio: String::new(),
        clinic_name: String::new(),
        languages_spoken: "English, Hindi".to_string(),
        hospital_affiliations: String::new(),
        average_rating: 4.0,
        total_reviews: 10,
        total_patients: 50,
        is_available: true,
        is_verified: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        specializations: vec![],
        availability_slots: vec![],
    }
}

fn filters(entries: &[(&str, &str)]) -> SearchFilters {
    let mut f = SearchFilters::default();
    for (name, value) in entries {
        let value = Some(value.to_string());
        match *name {
            "specialty" => f.specialty = value,
            "city" => f.city = value,
            "state" => f.state = value,
            "search_query" => f.search_query = value,
            "min_experience" => f.min_experience = value,
            "max_fee" => f.max_fee = value,
            "rating_min" => f.rating_min = value,
            "language" => f.language = value,
            "verified_only" => f.verified_only = value,
            "availability_day" => f.availability_day = value,
            "sort_by" => f.sort_by = value,
            other => panic!("unknown filter {}", other),
        }
    }
    f
}

fn run(entries: &[(&str, &str)], doctors: &[Doctor]) -> Vec<Doctor> {
    ProviderQuery::from_filters(&filters(entries)).apply(doctors.to_vec())
}

#[test]
fn empty_filter_set_returns_all_available_in_default_order() {
    let mut a = doctor("Asha", Specialty::Cardiology);
    a.average_rating = 4.8;
    let mut b = doctor("Vikram", Specialty::General);
    b.average_rating = 4.2;
    let mut gone = doctor("Nisha", Specialty::General);
    gone.average_rating = 5.0;
    gone.is_available = false;

    let result = run(&[], &[b.clone(), gone, a.clone()]);

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, a.id);
    assert_eq!(result[1].id, b.id);
}

#[test]
fn specialty_and_verification_scenario() {
    let mut a = doctor("Asha", Specialty::Cardiology);
    a.city = "Delhi".to_string();
    a.average_rating = 4.8;
    a.is_verified = true;
    let mut b = doctor("Vikram", Specialty::Cardiology);
    b.city = "Mumbai".to_string();
    b.average_rating = 4.2;
    b.is_verified = false;
    let catalog = [a.clone(), b.clone()];

    let result = run(
        &[
            ("specialty", "cardiology"),
            ("verified_only", "on"),
            ("sort_by", "rating"),
        ],
        &catalog,
    );
    assert_eq!(result.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a.id]);

    let result = run(&[("city", "Delhi")], &catalog);
    assert_eq!(result.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a.id]);

    let mut cheap = a.clone();
    cheap.consultation_fee = 300.0;
    let result = run(&[("sort_by", "fee_low")], &[b.clone(), cheap.clone()]);
    assert_eq!(
        result.iter().map(|d| d.id).collect::<Vec<_>>(),
        vec![cheap.id, b.id]
    );
}

#[test]
fn malformed_numeric_filters_are_not_applied() {
    let mut junior = doctor("Asha", Specialty::General);
    junior.experience_years = 5;
    let mut senior = doctor("Vikram", Specialty::General);
    senior.experience_years = 15;
    let catalog = [junior.clone(), senior.clone()];

    let unfiltered = run(&[], &catalog);
    let malformed = run(&[("min_experience", "abc")], &catalog);
    assert_eq!(
        unfiltered.iter().map(|d| d.id).collect::<Vec<_>>(),
        malformed.iter().map(|d| d.id).collect::<Vec<_>>()
    );

    let applied = run(&[("min_experience", "10")], &catalog);
    assert_eq!(applied.iter().map(|d| d.id).collect::<Vec<_>>(), vec![senior.id]);

    // Same degradation for fee, rating, and availability day
    assert_eq!(run(&[("max_fee", "cheap")], &catalog).len(), 2);
    assert_eq!(run(&[("rating_min", "good")], &catalog).len(), 2);
    assert_eq!(run(&[("availability_day", "monday")], &catalog).len(), 2);
}

#[test]
fn unknown_specialty_value_is_not_applied() {
    let catalog = [
        doctor("Asha", Specialty::Cardiology),
        doctor("Vikram", Specialty::General),
    ];
    assert_eq!(run(&[("specialty", "astrology")], &catalog).len(), 2);
    assert_eq!(run(&[("specialty", "cardiology")], &catalog).len(), 1);
}

#[test]
fn text_search_matches_any_field_without_duplicates() {
    let mut multi = doctor("Asha", Specialty::Cardiology);
    multi.bio = "Focused on heart health".to_string();
    multi.clinic_name = "Heart Care Center".to_string();
    multi.specializations = vec![DoctorSpecialization {
        id: Uuid::new_v4(),
        doctor_id: multi.id,
        name: "Heart Surgery".to_string(),
        is_primary: true,
    }];
    let mut affiliated = doctor("Vikram", Specialty::General);
    affiliated.hospital_affiliations = "City Heart Institute".to_string();
    let unrelated = doctor("Nisha", Specialty::Dermatology);

    let result = run(
        &[("search_query", "heart")],
        &[multi.clone(), affiliated.clone(), unrelated],
    );

    // A doctor matching through several fields still appears exactly once
    let ids: Vec<Uuid> = result.iter().map(|d| d.id).collect();
    assert_eq!(ids.iter().filter(|id| **id == multi.id).count(), 1);
    assert!(ids.contains(&affiliated.id));
    assert_eq!(ids.len(), 2);
}

#[test]
fn text_search_with_no_match_returns_empty() {
    let catalog = [doctor("Asha", Specialty::Cardiology)];
    assert!(run(&[("search_query", "nonexistent")], &catalog).is_empty());
}

#[test]
fn language_filter_is_case_insensitive_substring() {
    let mut hindi = doctor("Asha", Specialty::General);
    hindi.languages_spoken = "Hindi, English".to_string();
    let mut tamil = doctor("Vikram", Specialty::General);
    tamil.languages_spoken = "Tamil".to_string();

    let result = run(&[("language", "hindi")], &[hindi.clone(), tamil]);
    assert_eq!(result.iter().map(|d| d.id).collect::<Vec<_>>(), vec![hindi.id]);
}

#[test]
fn availability_day_requires_an_active_slot() {
    let mut tuesday = doctor("Asha", Specialty::General);
    tuesday.availability_slots = vec![AvailabilitySlot {
        id: Uuid::new_v4(),
        doctor_id: tuesday.id,
        day_of_week: 1,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        is_active: true,
    }];
    let mut inactive = doctor("Vikram", Specialty::General);
    inactive.availability_slots = vec![AvailabilitySlot {
        id: Uuid::new_v4(),
        doctor_id: inactive.id,
        day_of_week: 1,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        is_active: false,
    }];
    let catalog = [tuesday.clone(), inactive];

    let result = run(&[("availability_day", "1")], &catalog);
    assert_eq!(result.iter().map(|d| d.id).collect::<Vec<_>>(), vec![tuesday.id]);

    assert!(run(&[("availability_day", "5")], &catalog).is_empty());
}

#[test]
fn sort_orders_are_honored() {
    let mut a = doctor("Asha", Specialty::General);
    a.experience_years = 20;
    a.consultation_fee = 900.0;
    a.total_reviews = 3;
    a.created_at = Utc::now() - Duration::days(10);
    let mut b = doctor("Vikram", Specialty::General);
    b.experience_years = 5;
    b.consultation_fee = 200.0;
    b.total_reviews = 40;
    b.created_at = Utc::now();
    let catalog = [a.clone(), b.clone()];

    let by = |sort: &str| -> Vec<Uuid> {
        run(&[("sort_by", sort)], &catalog)
            .iter()
            .map(|d| d.id)
            .collect()
    };

    assert_eq!(by("experience"), vec![a.id, b.id]);
    assert_eq!(by("fee_low"), vec![b.id, a.id]);
    assert_eq!(by("fee_high"), vec![a.id, b.id]);
    assert_eq!(by("reviews"), vec![b.id, a.id]);
    assert_eq!(by("newest"), vec![b.id, a.id]);
    assert_eq!(by("name"), vec![a.id, b.id]);
}

#[test]
fn relevance_is_rating_order_even_with_a_text_query() {
    let mut low = doctor("Asha", Specialty::General);
    low.average_rating = 3.5;
    low.bio = "general practice".to_string();
    let mut high = doctor("Vikram", Specialty::General);
    high.average_rating = 4.9;
    high.bio = "general practice".to_string();
    let catalog = [low.clone(), high.clone()];

    let relevance = run(&[("search_query", "general practice")], &catalog);
    let rating = run(
        &[("search_query", "general practice"), ("sort_by", "rating")],
        &catalog,
    );
    assert_eq!(
        relevance.iter().map(|d| d.id).collect::<Vec<_>>(),
        rating.iter().map(|d| d.id).collect::<Vec<_>>()
    );
    assert_eq!(relevance[0].id, high.id);
}

#[test]
fn identical_queries_return_identical_sequences() {
    // Equal on every sort key, so ordering falls through to the id tie-break
    let doctors: Vec<Doctor> = (0..8).map(|_| doctor("Asha", Specialty::General)).collect();
    let entries = [("sort_by", "rating")];

    let first: Vec<Uuid> = run(&entries, &doctors).iter().map(|d| d.id).collect();
    let second: Vec<Uuid> = run(&entries, &doctors).iter().map(|d| d.id).collect();
    assert_eq!(first, second);

    let mut expected: Vec<Uuid> = doctors.iter().map(|d| d.id).collect();
    expected.sort();
    assert_eq!(first, expected);
}
