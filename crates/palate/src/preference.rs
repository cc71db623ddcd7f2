//! Preference profiling from interaction history
//!
//! Converts a user's interaction window into a structured preference
//! profile: attribute frequency maps, the rating distribution, and the
//! new-user flag that short-circuits the pipeline to the popularity
//! ranker. Pure read + compute; profiles are rebuilt on every request and
//! never persisted.

use crate::store::{Catalog, InteractionQuery, InteractionStore};
use chrono::{Duration, Utc};
use dining_gateway_core::models::{Interaction, MenuItem};
use dining_gateway_core::types::{DietaryTag, SpiceLevel};
use dining_gateway_core::Result;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use uuid::Uuid;

/// A user's derived taste profile over the interaction window
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceProfile {
    pub user_id: Uuid,
    /// Mean of all rated interactions in the window, 0 if none
    pub avg_rating: f32,
    pub total_interactions: usize,
    pub cuisine_freq: HashMap<String, usize>,
    pub category_freq: HashMap<String, usize>,
    pub spice_freq: HashMap<SpiceLevel, usize>,
    pub dietary_freq: HashMap<DietaryTag, usize>,
    /// Counts of ratings 1..=5, indexed by rating - 1
    pub rating_distribution: [usize; 5],
}

impl PreferenceProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            avg_rating: 0.0,
            total_interactions: 0,
            cuisine_freq: HashMap::new(),
            category_freq: HashMap::new(),
            spice_freq: HashMap::new(),
            dietary_freq: HashMap::new(),
            rating_distribution: [0; 5],
        }
    }

    /// Zero interactions in the window: cold start
    pub fn is_new_user(&self) -> bool {
        self.total_interactions == 0
    }

    /// Preferred cuisines, most frequent first
    pub fn preferred_cuisines(&self) -> Vec<String> {
        ranked_keys(&self.cuisine_freq)
    }

    pub fn top_cuisines(&self, n: usize) -> Vec<String> {
        let mut cuisines = self.preferred_cuisines();
        cuisines.truncate(n);
        cuisines
    }

    pub fn top_categories(&self, n: usize) -> Vec<String> {
        let mut categories = ranked_keys(&self.category_freq);
        categories.truncate(n);
        categories
    }

    pub fn top_spice_levels(&self, n: usize) -> Vec<SpiceLevel> {
        let mut levels = ranked_keys(&self.spice_freq);
        levels.truncate(n);
        levels
    }

    /// Every dietary tag seen in the window, most frequent first
    pub fn preferred_dietary_tags(&self) -> Vec<DietaryTag> {
        ranked_keys(&self.dietary_freq)
    }
}

/// Keys sorted by descending frequency; ties broken by key order so the
/// ranking is deterministic.
fn ranked_keys<K: Clone + Ord + Hash>(freq: &HashMap<K, usize>) -> Vec<K> {
    let mut entries: Vec<(&K, &usize)> = freq.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().map(|(key, _)| key.clone()).collect()
}

/// Builds preference profiles from the interaction store and catalog
pub struct PreferenceAnalyzer {
    catalog: Arc<dyn Catalog>,
    interactions: Arc<dyn InteractionStore>,
}

impl PreferenceAnalyzer {
    pub fn new(catalog: Arc<dyn Catalog>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self {
            catalog,
            interactions,
        }
    }

    /// Profile from the user's interactions over the lookback window
    pub async fn analyze(&self, user_id: Uuid, window: Duration) -> Result<PreferenceProfile> {
        let since = Utc::now() - window;
        let events = self
            .interactions
            .query(&InteractionQuery::for_user(user_id).since(since))
            .await?;
        self.profile_from(user_id, &events).await
    }

    /// Profile from an already-fetched interaction slice
    pub async fn profile_from(
        &self,
        user_id: Uuid,
        events: &[Interaction],
    ) -> Result<PreferenceProfile> {
        let mut profile = PreferenceProfile::empty(user_id);
        profile.total_interactions = events.len();
        if events.is_empty() {
            return Ok(profile);
        }

        let mut item_ids: Vec<Uuid> = events.iter().map(|event| event.item_id).collect();
        item_ids.sort();
        item_ids.dedup();
        let items: HashMap<Uuid, MenuItem> = self
            .catalog
            .find_items_by_ids(&item_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut rating_sum = 0u32;
        let mut rating_count = 0u32;

        for event in events {
            if let Some(rating) = event.rating {
                rating_sum += u32::from(rating);
                rating_count += 1;
                if (1..=5).contains(&rating) {
                    profile.rating_distribution[(rating - 1) as usize] += 1;
                }
            }

            // One occurrence per interaction per attribute value
            if let Some(item) = items.get(&event.item_id) {
                *profile.cuisine_freq.entry(item.cuisine.clone()).or_insert(0) += 1;
                *profile
                    .category_freq
                    .entry(item.category.clone())
                    .or_insert(0) += 1;
                *profile.spice_freq.entry(item.spice_level).or_insert(0) += 1;
                for tag in &item.dietary_tags {
                    *profile.dietary_freq.entry(*tag).or_insert(0) += 1;
                }
            }
        }

        if rating_count > 0 {
            profile.avg_rating = rating_sum as f32 / rating_count as f32;
        }

        Ok(profile)
    }
}
