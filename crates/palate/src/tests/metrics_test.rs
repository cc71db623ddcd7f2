//! Evaluation metric tests

use crate::evaluation::{diversity_score, ndcg_at_k, precision_at_k, recall_at_k};
use chrono::Utc;
use dining_gateway_core::models::MenuItem;
use dining_gateway_core::types::SpiceLevel;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn item(cuisine: &str, category: &str) -> MenuItem {
    MenuItem {
        id: Uuid::new_v4(),
        name: format!("{} {}", cuisine, category),
        description: String::new(),
        price_cents: 800,
        category: category.to_string(),
        cuisine: cuisine.to_string(),
        spice_level: SpiceLevel::Mild,
        dietary_tags: Vec::new(),
        preparation_minutes: 15,
        availability: true,
        average_rating: 4.0,
        total_ratings: 8,
        popularity_score: MenuItem::compute_popularity(4.0, 8),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_precision_and_recall_with_one_liked_item() {
    // Recommendations [A, C, D]; test ratings A=5 (liked), B=3 (not liked)
    let a = Uuid::new_v4();
    let c = Uuid::new_v4();
    let d = Uuid::new_v4();

    let recommended = vec![a, c, d];
    let liked: HashSet<Uuid> = [a].into_iter().collect();

    assert!((precision_at_k(&recommended, &liked) - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(recall_at_k(&recommended, &liked), Some(1.0));
}

#[test]
fn test_precision_zero_for_empty_recommendations() {
    let liked: HashSet<Uuid> = [Uuid::new_v4()].into_iter().collect();
    assert_eq!(precision_at_k(&[], &liked), 0.0);
}

#[test]
fn test_recall_skips_users_without_liked_items() {
    let recommended = vec![Uuid::new_v4()];
    assert_eq!(recall_at_k(&recommended, &HashSet::new()), None);
}

#[test]
fn test_ndcg_is_one_for_perfect_ranking() {
    let best = Uuid::new_v4();
    let good = Uuid::new_v4();
    let fair = Uuid::new_v4();

    let ratings: HashMap<Uuid, u8> = [(best, 5), (good, 4), (fair, 3)].into_iter().collect();
    let recommended = vec![best, good, fair];

    assert!((ndcg_at_k(&recommended, &ratings, 10) - 1.0).abs() < 1e-6);
}

#[test]
fn test_ndcg_penalizes_inverted_ranking() {
    let best = Uuid::new_v4();
    let fair = Uuid::new_v4();

    let ratings: HashMap<Uuid, u8> = [(best, 5), (fair, 1)].into_iter().collect();

    let perfect = ndcg_at_k(&[best, fair], &ratings, 10);
    let inverted = ndcg_at_k(&[fair, best], &ratings, 10);

    assert!((perfect - 1.0).abs() < 1e-6);
    assert!(inverted < perfect);
    assert!(inverted > 0.0);
}

#[test]
fn test_ndcg_zero_without_rated_items() {
    let recommended = vec![Uuid::new_v4()];
    assert_eq!(ndcg_at_k(&recommended, &HashMap::new(), 10), 0.0);
}

#[test]
fn test_ndcg_unrated_recommendations_contribute_nothing() {
    let rated = Uuid::new_v4();
    let ratings: HashMap<Uuid, u8> = [(rated, 4)].into_iter().collect();

    // The rated item in first position dominates; strangers add zero gain
    let recommended = vec![rated, Uuid::new_v4(), Uuid::new_v4()];
    assert!((ndcg_at_k(&recommended, &ratings, 10) - 1.0).abs() < 1e-6);
}

#[test]
fn test_diversity_uniform_list_is_low() {
    let items = vec![
        item("Italian", "main"),
        item("Italian", "main"),
        item("Italian", "main"),
        item("Italian", "main"),
    ];
    // One category + one cuisine over 2 * 4 slots
    assert!((diversity_score(&items) - 0.25).abs() < 1e-6);
}

#[test]
fn test_diversity_distinct_list_caps_at_one() {
    let items = vec![item("Italian", "main"), item("Thai", "dessert")];
    assert_eq!(diversity_score(&items), 1.0);
}

#[test]
fn test_diversity_empty_list_is_zero() {
    assert_eq!(diversity_score(&[]), 0.0);
}
