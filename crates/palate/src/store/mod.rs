//! Storage contracts consumed by the recommendation engine
//!
//! The catalog and the interaction store are external collaborators; the
//! engine only depends on these read/write contracts. Two adapters ship
//! with the crate: a PostgreSQL implementation for serving and an
//! in-memory implementation for tests and offline experiments.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCatalog, InMemoryInteractionStore};
pub use postgres::{PgCatalog, PgInteractionStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dining_gateway_core::models::{Interaction, ItemStats, MenuItem};
use dining_gateway_core::types::{DietaryTag, InteractionKind, SpiceLevel};
use dining_gateway_core::Result;
use uuid::Uuid;

/// Availability constraint on a catalog query.
///
/// The popularity ranker degrades through these in order, so `Loose` and
/// `Any` exist as explicit steps rather than ad hoc query variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvailabilityFilter {
    /// `availability = true`
    #[default]
    Strict,
    /// `availability != false` (items with unknown availability pass)
    Loose,
    /// No availability constraint
    Any,
}

/// Catalog sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSort {
    /// popularity desc, rating desc, rating count desc
    #[default]
    Popularity,
    /// rating desc, rating count desc
    Rating,
    /// rating desc, newest first
    RatingRecency,
}

/// Attribute filter for catalog queries
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub cuisines: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub spice_levels: Option<Vec<SpiceLevel>>,
    pub dietary_tags: Option<Vec<DietaryTag>>,
    pub availability: AvailabilityFilter,
    pub sort: ItemSort,
    pub limit: Option<usize>,
}

impl ItemFilter {
    /// All available items, most popular first
    pub fn available() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: ItemSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_availability(mut self, availability: AvailabilityFilter) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_cuisines(mut self, cuisines: Vec<String>) -> Self {
        self.cuisines = Some(cuisines);
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_spice_levels(mut self, spice_levels: Vec<SpiceLevel>) -> Self {
        self.spice_levels = Some(spice_levels);
        self
    }

    pub fn with_dietary_tags(mut self, dietary_tags: Vec<DietaryTag>) -> Self {
        self.dietary_tags = Some(dietary_tags);
        self
    }
}

/// Filter for interaction queries.
///
/// `since` is inclusive, `until` exclusive.
#[derive(Debug, Clone, Default)]
pub struct InteractionQuery {
    pub user_id: Option<Uuid>,
    pub exclude_user: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub kind: Option<InteractionKind>,
    /// Only interactions carrying a rating
    pub rated_only: bool,
    /// Inclusive rating bounds
    pub rating_range: Option<(f32, f32)>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl InteractionQuery {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn excluding_user(mut self, user_id: Uuid) -> Self {
        self.exclude_user = Some(user_id);
        self
    }

    pub fn with_kind(mut self, kind: InteractionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn rated_only(mut self) -> Self {
        self.rated_only = true;
        self
    }

    pub fn with_rating_range(mut self, low: f32, high: f32) -> Self {
        self.rating_range = Some((low, high));
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Whether an interaction matches this filter
    pub fn matches(&self, interaction: &Interaction) -> bool {
        if let Some(user_id) = self.user_id {
            if interaction.user_id != user_id {
                return false;
            }
        }
        if let Some(excluded) = self.exclude_user {
            if interaction.user_id == excluded {
                return false;
            }
        }
        if let Some(item_id) = self.item_id {
            if interaction.item_id != item_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if interaction.kind != kind {
                return false;
            }
        }
        if self.rated_only && interaction.rating.is_none() {
            return false;
        }
        if let Some((low, high)) = self.rating_range {
            match interaction.rating {
                Some(rating) => {
                    let rating = rating as f32;
                    if rating < low || rating > high {
                        return false;
                    }
                }
                None => return false,
            }
        }
        if let Some(since) = self.since {
            if interaction.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if interaction.timestamp >= until {
                return false;
            }
        }
        true
    }
}

/// Read/write contract of the menu catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<MenuItem>>;

    async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>>;

    async fn find_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MenuItem>>;

    async fn count_available(&self) -> Result<u64>;

    /// Blind write of rolling rating statistics
    async fn update_item_stats(&self, id: Uuid, stats: ItemStats) -> Result<()>;

    /// Atomically fold one new rating into the item's rolling statistics.
    ///
    /// Concurrent ratings on the same item are possible; implementations
    /// must make the read-modify-write per-item atomic.
    async fn apply_rating(&self, id: Uuid, rating: u8) -> Result<ItemStats>;
}

/// Append-only contract of the interaction log
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn append(&self, interaction: Interaction) -> Result<()>;

    async fn query(&self, query: &InteractionQuery) -> Result<Vec<Interaction>>;

    async fn count(&self, query: &InteractionQuery) -> Result<u64>;

    async fn distinct_users(&self, query: &InteractionQuery) -> Result<Vec<Uuid>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dining_gateway_core::models::NewInteraction;

    #[test]
    fn test_query_matches_user_and_kind() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let interaction = NewInteraction::rating(user, Uuid::new_v4(), 4).into_interaction(Utc::now());

        assert!(InteractionQuery::for_user(user).matches(&interaction));
        assert!(!InteractionQuery::for_user(other).matches(&interaction));
        assert!(InteractionQuery::default()
            .with_kind(InteractionKind::Rating)
            .matches(&interaction));
        assert!(!InteractionQuery::default()
            .with_kind(InteractionKind::Order)
            .matches(&interaction));
    }

    #[test]
    fn test_query_rating_range_excludes_unrated() {
        let rated = NewInteraction::rating(Uuid::new_v4(), Uuid::new_v4(), 3).into_interaction(Utc::now());
        let unrated = NewInteraction::view(Uuid::new_v4(), Uuid::new_v4()).into_interaction(Utc::now());

        let query = InteractionQuery::default().with_rating_range(2.5, 3.5);
        assert!(query.matches(&rated));
        assert!(!query.matches(&unrated));

        let narrow = InteractionQuery::default().with_rating_range(4.0, 5.0);
        assert!(!narrow.matches(&rated));
    }

    #[test]
    fn test_query_time_bounds_half_open() {
        let now = Utc::now();
        let interaction = NewInteraction::view(Uuid::new_v4(), Uuid::new_v4()).into_interaction(now);

        assert!(InteractionQuery::default().since(now).matches(&interaction));
        assert!(!InteractionQuery::default().until(now).matches(&interaction));
        assert!(InteractionQuery::default()
            .until(now + chrono::Duration::seconds(1))
            .matches(&interaction));
    }
}
