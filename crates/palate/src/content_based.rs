//! Content-based filtering
//!
//! Ranks catalog items by attribute overlap with the user's preference
//! profile. Candidates come from up to four progressively looser catalog
//! queries; each item is scored with a weighted attribute match where
//! weights without any profile data are excluded from the normalization.

use crate::preference::PreferenceProfile;
use crate::store::{Catalog, ItemFilter, ItemSort};
use crate::types::{Reason, ScoredCandidate};
use dining_gateway_core::models::MenuItem;
use dining_gateway_core::types::Confidence;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const CUISINE_WEIGHT: f32 = 0.30;
const CATEGORY_WEIGHT: f32 = 0.25;
const SPICE_WEIGHT: f32 = 0.20;
const DIETARY_WEIGHT: f32 = 0.15;
const QUALITY_WEIGHT: f32 = 0.10;

/// Ratings count at which the quality bonus saturates
const QUALITY_SATURATION_RATINGS: f32 = 10.0;

pub struct ContentBasedRanker {
    catalog: Arc<dyn Catalog>,
}

impl ContentBasedRanker {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Top `count` items by attribute match score.
    ///
    /// Never fails: any catalog error degrades to an empty list.
    pub async fn recommend(&self, profile: &PreferenceProfile, count: usize) -> Vec<ScoredCandidate> {
        if count == 0 {
            return Vec::new();
        }
        match self.try_recommend(profile, count).await {
            Ok(scored) => scored,
            Err(error) => {
                warn!(user_id = %profile.user_id, %error, "content-based ranker degraded to empty");
                Vec::new()
            }
        }
    }

    async fn try_recommend(
        &self,
        profile: &PreferenceProfile,
        count: usize,
    ) -> anyhow::Result<Vec<ScoredCandidate>> {
        let queries = Self::candidate_queries(profile);
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        let per_query_limit = count.div_ceil(queries.len()) + 5;

        // Union of all query results, keeping first-seen order and the
        // best match score per item
        let mut order: Vec<Uuid> = Vec::new();
        let mut best: HashMap<Uuid, (f32, MenuItem)> = HashMap::new();

        for query in queries {
            let items = self
                .catalog
                .find_items(&query.with_sort(ItemSort::Rating).with_limit(per_query_limit))
                .await?;
            for item in items {
                let score = match_score(&item, profile);
                match best.get_mut(&item.id) {
                    Some(entry) => {
                        if score > entry.0 {
                            entry.0 = score;
                        }
                    }
                    None => {
                        order.push(item.id);
                        best.insert(item.id, (score, item));
                    }
                }
            }
        }

        let mut scored: Vec<ScoredCandidate> = order
            .into_iter()
            .filter_map(|id| best.remove(&id))
            .map(|(score, item)| {
                let confidence = if score > 0.8 {
                    Confidence::High
                } else if score > 0.6 {
                    Confidence::Medium
                } else {
                    Confidence::Low
                };
                ScoredCandidate::new(item.id, score, Reason::Content, confidence)
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(count);
        Ok(scored)
    }

    /// Build the progressively looser candidate queries, skipping any
    /// combination the profile has no data for.
    fn candidate_queries(profile: &PreferenceProfile) -> Vec<ItemFilter> {
        let cuisines = profile.preferred_cuisines();
        let categories = profile.top_categories(2);
        let spice_levels = profile.top_spice_levels(2);
        let dietary_tags = profile.preferred_dietary_tags();

        let mut queries = Vec::new();

        if !cuisines.is_empty() && !spice_levels.is_empty() {
            queries.push(
                ItemFilter::available()
                    .with_cuisines(cuisines.iter().take(2).cloned().collect())
                    .with_spice_levels(spice_levels.clone()),
            );
        }
        if !cuisines.is_empty() && !categories.is_empty() {
            queries.push(
                ItemFilter::available()
                    .with_cuisines(cuisines.iter().take(3).cloned().collect())
                    .with_categories(categories),
            );
        }
        if !dietary_tags.is_empty() {
            queries.push(ItemFilter::available().with_dietary_tags(dietary_tags));
        }
        if !cuisines.is_empty() {
            queries.push(ItemFilter::available().with_cuisines(cuisines));
        }

        queries
    }
}

/// Weighted attribute match in [0, 1].
///
/// Each attribute term is the item's value frequency over the attribute's
/// total frequency in the profile; the quality bonus rewards well-rated
/// items with enough ratings to trust. Weights whose attribute has no
/// profile data (no rating data, for the quality bonus) are excluded from
/// the denominator, so the score stays comparable across sparse profiles.
pub fn match_score(item: &MenuItem, profile: &PreferenceProfile) -> f32 {
    let mut achieved = 0.0f32;
    let mut applicable = 0.0f32;

    let cuisine_total: usize = profile.cuisine_freq.values().sum();
    if cuisine_total > 0 {
        applicable += CUISINE_WEIGHT;
        if let Some(freq) = profile.cuisine_freq.get(&item.cuisine) {
            achieved += CUISINE_WEIGHT * (*freq as f32 / cuisine_total as f32);
        }
    }

    let category_total: usize = profile.category_freq.values().sum();
    if category_total > 0 {
        applicable += CATEGORY_WEIGHT;
        if let Some(freq) = profile.category_freq.get(&item.category) {
            achieved += CATEGORY_WEIGHT * (*freq as f32 / category_total as f32);
        }
    }

    let spice_total: usize = profile.spice_freq.values().sum();
    if spice_total > 0 {
        applicable += SPICE_WEIGHT;
        if let Some(freq) = profile.spice_freq.get(&item.spice_level) {
            achieved += SPICE_WEIGHT * (*freq as f32 / spice_total as f32);
        }
    }

    let dietary_total: usize = profile.dietary_freq.values().sum();
    if dietary_total > 0 {
        applicable += DIETARY_WEIGHT;
        let matched: usize = item
            .dietary_tags
            .iter()
            .filter_map(|tag| profile.dietary_freq.get(tag))
            .sum();
        achieved += DIETARY_WEIGHT * (matched as f32 / dietary_total as f32).min(1.0);
    }

    if item.average_rating > 0.0 && item.total_ratings > 0 {
        applicable += QUALITY_WEIGHT;
        let quality = (item.average_rating / 5.0)
            * (item.total_ratings as f32 / QUALITY_SATURATION_RATINGS).min(1.0);
        achieved += QUALITY_WEIGHT * quality;
    }

    if applicable > 0.0 {
        achieved / applicable
    } else {
        0.0
    }
}
