//! Content-based scoring tests

use crate::content_based::{match_score, ContentBasedRanker};
use crate::preference::PreferenceProfile;
use crate::store::InMemoryCatalog;
use crate::types::Reason;
use chrono::Utc;
use dining_gateway_core::models::MenuItem;
use dining_gateway_core::types::{Confidence, DietaryTag, SpiceLevel};
use std::sync::Arc;
use uuid::Uuid;

fn item(cuisine: &str, category: &str, average_rating: f32, total_ratings: u32) -> MenuItem {
    MenuItem {
        id: Uuid::new_v4(),
        name: format!("{} {}", cuisine, category),
        description: String::new(),
        price_cents: 1100,
        category: category.to_string(),
        cuisine: cuisine.to_string(),
        spice_level: SpiceLevel::Medium,
        dietary_tags: vec![DietaryTag::Halal],
        preparation_minutes: 25,
        availability: true,
        average_rating,
        total_ratings,
        popularity_score: MenuItem::compute_popularity(average_rating, total_ratings),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn cuisine_only_profile(cuisine: &str) -> PreferenceProfile {
    let mut profile = PreferenceProfile::empty(Uuid::new_v4());
    profile.total_interactions = 3;
    profile.cuisine_freq.insert(cuisine.to_string(), 3);
    profile
}

#[test]
fn test_missing_attributes_excluded_from_denominator() {
    // Profile only has cuisine data; an unrated matching item should score
    // a perfect 1.0 because only the cuisine weight applies.
    let profile = cuisine_only_profile("Italian");
    let unrated = item("Italian", "main", 0.0, 0);

    let score = match_score(&unrated, &profile);
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn test_quality_bonus_applies_when_item_has_ratings() {
    let profile = cuisine_only_profile("Italian");

    // Perfect cuisine match and saturated quality bonus: still 1.0
    let rated = item("Italian", "main", 5.0, 10);
    assert!((match_score(&rated, &profile) - 1.0).abs() < 1e-6);

    // No cuisine match, only the quality term: 0.1 / (0.3 + 0.1)
    let mismatched = item("French", "main", 5.0, 10);
    assert!((match_score(&mismatched, &profile) - 0.25).abs() < 1e-6);
}

#[test]
fn test_quality_bonus_scales_with_rating_volume() {
    let profile = cuisine_only_profile("Italian");

    // 5 of 10 saturation ratings halves the bonus
    let lightly_rated = item("French", "main", 5.0, 5);
    let expected = (0.1 * (5.0 / 5.0) * 0.5) / 0.4;
    assert!((match_score(&lightly_rated, &profile) - expected).abs() < 1e-6);
}

#[test]
fn test_empty_profile_scores_zero_without_item_ratings() {
    let profile = PreferenceProfile::empty(Uuid::new_v4());
    let unrated = item("Italian", "main", 0.0, 0);
    assert_eq!(match_score(&unrated, &profile), 0.0);
}

#[test]
fn test_split_preferences_normalize_by_attribute_totals() {
    let mut profile = PreferenceProfile::empty(Uuid::new_v4());
    profile.total_interactions = 4;
    profile.cuisine_freq.insert("Italian".to_string(), 3);
    profile.cuisine_freq.insert("French".to_string(), 1);

    let italian = item("Italian", "main", 0.0, 0);
    let french = item("French", "main", 0.0, 0);

    assert!((match_score(&italian, &profile) - 0.75).abs() < 1e-6);
    assert!((match_score(&french, &profile) - 0.25).abs() < 1e-6);
}

#[tokio::test]
async fn test_ranker_prefers_profile_matches() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let matching = item("Italian", "main", 4.5, 20);
    let other = item("German", "main", 4.9, 20);
    catalog.insert(matching.clone()).await;
    catalog.insert(other.clone()).await;

    let ranker = ContentBasedRanker::new(catalog);
    let profile = cuisine_only_profile("Italian");

    let results = ranker.recommend(&profile, 5).await;
    assert!(!results.is_empty());
    assert_eq!(results[0].item_id, matching.id);
    assert_eq!(results[0].reason, Reason::Content);
    // Full cuisine match plus a strong quality bonus
    assert_eq!(results[0].confidence, Confidence::High);
    for window in results.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[tokio::test]
async fn test_ranker_empty_for_profile_without_preferences() {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.insert(item("Italian", "main", 4.0, 5)).await;

    let ranker = ContentBasedRanker::new(catalog);
    let profile = PreferenceProfile::empty(Uuid::new_v4());

    // No preference data means no candidate queries
    assert!(ranker.recommend(&profile, 5).await.is_empty());
}
