//! Preference analyzer tests

use crate::preference::PreferenceAnalyzer;
use crate::store::{InMemoryCatalog, InMemoryInteractionStore, InteractionStore};
use chrono::{Duration, Utc};
use dining_gateway_core::models::{MenuItem, NewInteraction};
use dining_gateway_core::types::{DietaryTag, SpiceLevel};
use std::sync::Arc;
use uuid::Uuid;

fn item(cuisine: &str, category: &str, spice: SpiceLevel, tags: Vec<DietaryTag>) -> MenuItem {
    MenuItem {
        id: Uuid::new_v4(),
        name: format!("{} {}", cuisine, category),
        description: String::new(),
        price_cents: 1000,
        category: category.to_string(),
        cuisine: cuisine.to_string(),
        spice_level: spice,
        dietary_tags: tags,
        preparation_minutes: 20,
        availability: true,
        average_rating: 4.2,
        total_ratings: 12,
        popularity_score: MenuItem::compute_popularity(4.2, 12),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn fixture() -> (Arc<InMemoryCatalog>, Arc<InMemoryInteractionStore>, PreferenceAnalyzer) {
    let catalog = Arc::new(InMemoryCatalog::new());
    let store = Arc::new(InMemoryInteractionStore::new());
    let analyzer = PreferenceAnalyzer::new(catalog.clone(), store.clone());
    (catalog, store, analyzer)
}

#[tokio::test]
async fn test_frequency_maps_count_per_interaction() {
    let (catalog, store, analyzer) = fixture().await;
    let user = Uuid::new_v4();

    let biryani = item(
        "Pakistani",
        "main",
        SpiceLevel::Medium,
        vec![DietaryTag::Halal],
    );
    catalog.insert(biryani.clone()).await;

    // Two interactions with the same item count its attributes twice
    for _ in 0..2 {
        store
            .append(NewInteraction::view(user, biryani.id).into_interaction(Utc::now()))
            .await
            .unwrap();
    }

    let profile = analyzer.analyze(user, Duration::days(30)).await.unwrap();
    assert_eq!(profile.total_interactions, 2);
    assert_eq!(profile.cuisine_freq.get("Pakistani"), Some(&2));
    assert_eq!(profile.category_freq.get("main"), Some(&2));
    assert_eq!(profile.spice_freq.get(&SpiceLevel::Medium), Some(&2));
    assert_eq!(profile.dietary_freq.get(&DietaryTag::Halal), Some(&2));
}

#[tokio::test]
async fn test_each_dietary_tag_counts_once_per_interaction() {
    let (catalog, store, analyzer) = fixture().await;
    let user = Uuid::new_v4();

    let dish = item(
        "Indian",
        "main",
        SpiceLevel::Hot,
        vec![DietaryTag::Vegan, DietaryTag::GlutenFree],
    );
    catalog.insert(dish.clone()).await;
    store
        .append(NewInteraction::order(user, dish.id, 1).into_interaction(Utc::now()))
        .await
        .unwrap();

    let profile = analyzer.analyze(user, Duration::days(30)).await.unwrap();
    assert_eq!(profile.dietary_freq.get(&DietaryTag::Vegan), Some(&1));
    assert_eq!(profile.dietary_freq.get(&DietaryTag::GlutenFree), Some(&1));
}

#[tokio::test]
async fn test_avg_rating_over_rated_interactions_only() {
    let (catalog, store, analyzer) = fixture().await;
    let user = Uuid::new_v4();

    let dish = item("Thai", "main", SpiceLevel::Hot, vec![]);
    catalog.insert(dish.clone()).await;

    store
        .append(NewInteraction::rating(user, dish.id, 5).into_interaction(Utc::now()))
        .await
        .unwrap();
    store
        .append(NewInteraction::rating(user, dish.id, 4).into_interaction(Utc::now()))
        .await
        .unwrap();
    store
        .append(NewInteraction::view(user, dish.id).into_interaction(Utc::now()))
        .await
        .unwrap();

    let profile = analyzer.analyze(user, Duration::days(30)).await.unwrap();
    assert!((profile.avg_rating - 4.5).abs() < 1e-6);
    assert_eq!(profile.rating_distribution[4], 1);
    assert_eq!(profile.rating_distribution[3], 1);
    assert_eq!(profile.total_interactions, 3);
}

#[tokio::test]
async fn test_interactions_outside_window_are_ignored() {
    let (catalog, store, analyzer) = fixture().await;
    let user = Uuid::new_v4();

    let dish = item("Japanese", "main", SpiceLevel::Mild, vec![]);
    catalog.insert(dish.clone()).await;
    store
        .append(
            NewInteraction::view(user, dish.id).into_interaction(Utc::now() - Duration::days(45)),
        )
        .await
        .unwrap();

    let profile = analyzer.analyze(user, Duration::days(30)).await.unwrap();
    assert!(profile.is_new_user());
}

#[tokio::test]
async fn test_new_user_profile_is_empty() {
    let (_, _, analyzer) = fixture().await;
    let profile = analyzer
        .analyze(Uuid::new_v4(), Duration::days(30))
        .await
        .unwrap();

    assert!(profile.is_new_user());
    assert_eq!(profile.avg_rating, 0.0);
    assert!(profile.cuisine_freq.is_empty());
}

#[tokio::test]
async fn test_top_cuisines_ranked_by_frequency() {
    let (catalog, store, analyzer) = fixture().await;
    let user = Uuid::new_v4();

    let pakistani = item("Pakistani", "main", SpiceLevel::Medium, vec![]);
    let italian = item("Italian", "main", SpiceLevel::Mild, vec![]);
    catalog.insert(pakistani.clone()).await;
    catalog.insert(italian.clone()).await;

    for _ in 0..3 {
        store
            .append(NewInteraction::view(user, pakistani.id).into_interaction(Utc::now()))
            .await
            .unwrap();
    }
    store
        .append(NewInteraction::view(user, italian.id).into_interaction(Utc::now()))
        .await
        .unwrap();

    let profile = analyzer.analyze(user, Duration::days(30)).await.unwrap();
    assert_eq!(
        profile.top_cuisines(2),
        vec!["Pakistani".to_string(), "Italian".to_string()]
    );
    assert_eq!(profile.top_cuisines(1), vec!["Pakistani".to_string()]);
}
