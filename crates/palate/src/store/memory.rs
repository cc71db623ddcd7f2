//! In-memory storage adapters
//!
//! Back the engine in tests and offline experiments. Both adapters
//! serialize writers behind a lock, so the per-item statistics update in
//! `apply_rating` is atomic.

use super::{AvailabilityFilter, Catalog, InteractionQuery, InteractionStore, ItemFilter, ItemSort};
use async_trait::async_trait;
use dining_gateway_core::error::DiningGatewayError;
use dining_gateway_core::models::{Interaction, ItemStats, MenuItem};
use dining_gateway_core::Result;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory menu catalog
#[derive(Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<Uuid, MenuItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item (fixture setup)
    pub async fn insert(&self, item: MenuItem) {
        self.items.write().await.insert(item.id, item);
    }

    fn availability_matches(filter: AvailabilityFilter, item: &MenuItem) -> bool {
        match filter {
            AvailabilityFilter::Strict => item.availability,
            // availability is a required bool in memory, so loose
            // collapses to strict; the chain still ends at Any
            AvailabilityFilter::Loose => item.availability,
            AvailabilityFilter::Any => true,
        }
    }

    fn filter_matches(filter: &ItemFilter, item: &MenuItem) -> bool {
        if !Self::availability_matches(filter.availability, item) {
            return false;
        }
        if let Some(ref cuisines) = filter.cuisines {
            if !cuisines.contains(&item.cuisine) {
                return false;
            }
        }
        if let Some(ref categories) = filter.categories {
            if !categories.contains(&item.category) {
                return false;
            }
        }
        if let Some(ref spice_levels) = filter.spice_levels {
            if !spice_levels.contains(&item.spice_level) {
                return false;
            }
        }
        if let Some(ref tags) = filter.dietary_tags {
            if !item.dietary_tags.iter().any(|tag| tags.contains(tag)) {
                return false;
            }
        }
        true
    }

    fn compare(sort: ItemSort, a: &MenuItem, b: &MenuItem) -> Ordering {
        match sort {
            ItemSort::Popularity => b
                .popularity_score
                .total_cmp(&a.popularity_score)
                .then(b.average_rating.total_cmp(&a.average_rating))
                .then(b.total_ratings.cmp(&a.total_ratings)),
            ItemSort::Rating => b
                .average_rating
                .total_cmp(&a.average_rating)
                .then(b.total_ratings.cmp(&a.total_ratings)),
            ItemSort::RatingRecency => b
                .average_rating
                .total_cmp(&a.average_rating)
                .then(b.created_at.cmp(&a.created_at)),
        }
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<MenuItem>> {
        let items = self.items.read().await;
        let mut matched: Vec<MenuItem> = items
            .values()
            .filter(|item| Self::filter_matches(filter, item))
            .cloned()
            .collect();
        matched.sort_by(|a, b| Self::compare(filter.sort, a, b).then(a.id.cmp(&b.id)));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn find_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MenuItem>> {
        let items = self.items.read().await;
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    async fn count_available(&self) -> Result<u64> {
        let items = self.items.read().await;
        Ok(items.values().filter(|item| item.availability).count() as u64)
    }

    async fn update_item_stats(&self, id: Uuid, stats: ItemStats) -> Result<()> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or_else(|| DiningGatewayError::not_found("menu item"))?;
        item.average_rating = stats.average_rating;
        item.total_ratings = stats.total_ratings;
        item.popularity_score = stats.popularity_score;
        item.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn apply_rating(&self, id: Uuid, rating: u8) -> Result<ItemStats> {
        // Write lock held across read-modify-write: per-item atomicity
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or_else(|| DiningGatewayError::not_found("menu item"))?;
        let stats = item.stats_with_rating(rating);
        item.average_rating = stats.average_rating;
        item.total_ratings = stats.total_ratings;
        item.popularity_score = stats.popularity_score;
        item.updated_at = chrono::Utc::now();
        Ok(stats)
    }
}

/// In-memory append-only interaction log
#[derive(Default)]
pub struct InMemoryInteractionStore {
    events: RwLock<Vec<Interaction>>,
}

impl InMemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn append(&self, interaction: Interaction) -> Result<()> {
        self.events.write().await.push(interaction);
        Ok(())
    }

    async fn query(&self, query: &InteractionQuery) -> Result<Vec<Interaction>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|interaction| query.matches(interaction))
            .cloned()
            .collect())
    }

    async fn count(&self, query: &InteractionQuery) -> Result<u64> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|interaction| query.matches(interaction))
            .count() as u64)
    }

    async fn distinct_users(&self, query: &InteractionQuery) -> Result<Vec<Uuid>> {
        let events = self.events.read().await;
        let users: HashSet<Uuid> = events
            .iter()
            .filter(|interaction| query.matches(interaction))
            .map(|interaction| interaction.user_id)
            .collect();
        let mut users: Vec<Uuid> = users.into_iter().collect();
        users.sort();
        Ok(users)
    }
}
