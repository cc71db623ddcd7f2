//! Neighbor-based collaborative filtering
//!
//! Recommends items liked by users whose rating behavior resembles the
//! target's: neighbors are selected from a rating band around the target's
//! mean, ranked by how close their own mean lands, and their highly-rated
//! items become candidates weighted by that closeness.

use crate::preference::PreferenceProfile;
use crate::store::{Catalog, InteractionQuery, InteractionStore};
use crate::types::{Reason, ScoredCandidate};
use dining_gateway_core::models::{Interaction, MenuItem};
use dining_gateway_core::types::{Confidence, InteractionKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Rating-band anchor for users without any rated interactions
const UNRATED_TARGET_MEAN: f32 = 4.5;
/// Similarity above which a candidate is high-confidence
const HIGH_CONFIDENCE_SIMILARITY: f32 = 0.8;

pub struct CollaborativeRanker {
    catalog: Arc<dyn Catalog>,
    interactions: Arc<dyn InteractionStore>,
    /// Number of closest neighbors considered
    neighbor_limit: usize,
    /// Half-width of the rating band around the target mean
    rating_tolerance: f32,
    /// Minimum neighbor rating treated as "liked"
    liked_threshold: u8,
}

impl CollaborativeRanker {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        interactions: Arc<dyn InteractionStore>,
        neighbor_limit: usize,
        rating_tolerance: f32,
        liked_threshold: u8,
    ) -> Self {
        Self {
            catalog,
            interactions,
            neighbor_limit,
            rating_tolerance,
            liked_threshold,
        }
    }

    /// Top `count` items from the most similar neighbors.
    ///
    /// Never fails: any store error degrades to an empty list.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        profile: &PreferenceProfile,
        count: usize,
    ) -> Vec<ScoredCandidate> {
        if count == 0 {
            return Vec::new();
        }
        match self.try_recommend(user_id, profile, count).await {
            Ok(scored) => scored,
            Err(error) => {
                warn!(%user_id, %error, "collaborative ranker degraded to empty");
                Vec::new()
            }
        }
    }

    async fn try_recommend(
        &self,
        user_id: Uuid,
        profile: &PreferenceProfile,
        count: usize,
    ) -> anyhow::Result<Vec<ScoredCandidate>> {
        let target_mean = if profile.avg_rating > 0.0 {
            profile.avg_rating
        } else {
            UNRATED_TARGET_MEAN
        };
        let low = (target_mean - self.rating_tolerance).max(1.0);
        let high = (target_mean + self.rating_tolerance).min(5.0);

        // Other users' rating interactions inside the band
        let banded = self
            .interactions
            .query(
                &InteractionQuery::default()
                    .excluding_user(user_id)
                    .with_kind(InteractionKind::Rating)
                    .with_rating_range(low, high),
            )
            .await?;
        if banded.is_empty() {
            return Ok(Vec::new());
        }

        let neighbors = self.rank_neighbors(&banded, target_mean);

        // Items the target has already seen never become candidates
        let seen: HashSet<Uuid> = self
            .interactions
            .query(&InteractionQuery::for_user(user_id))
            .await?
            .into_iter()
            .map(|interaction| interaction.item_id)
            .collect();

        // Join candidate items once for the availability check
        let mut candidate_ids: Vec<Uuid> = banded
            .iter()
            .filter(|interaction| interaction.rating.unwrap_or(0) >= self.liked_threshold)
            .map(|interaction| interaction.item_id)
            .collect();
        candidate_ids.sort();
        candidate_ids.dedup();
        let items: HashMap<Uuid, MenuItem> = self
            .catalog
            .find_items_by_ids(&candidate_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        // Most similar neighbor wins on duplicate items
        let mut picked: HashSet<Uuid> = HashSet::new();
        let mut scored: Vec<ScoredCandidate> = Vec::new();

        for neighbor in &neighbors {
            let similarity = 1.0 - (neighbor.mean - target_mean).abs() / 4.0;
            for interaction in &neighbor.ratings {
                let Some(rating) = interaction.rating else {
                    continue;
                };
                if rating < self.liked_threshold {
                    continue;
                }
                if seen.contains(&interaction.item_id) || picked.contains(&interaction.item_id) {
                    continue;
                }
                let Some(item) = items.get(&interaction.item_id) else {
                    continue;
                };
                if !item.availability {
                    continue;
                }

                let confidence = if similarity > HIGH_CONFIDENCE_SIMILARITY {
                    Confidence::High
                } else {
                    Confidence::Medium
                };
                scored.push(ScoredCandidate::new(
                    item.id,
                    rating as f32 * similarity,
                    Reason::Collaborative,
                    confidence,
                ));
                picked.insert(item.id);
            }
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(count);
        Ok(scored)
    }

    /// Group banded ratings by neighbor and keep the `neighbor_limit`
    /// users whose mean is closest to the target's, ascending distance.
    fn rank_neighbors(&self, banded: &[Interaction], target_mean: f32) -> Vec<Neighbor> {
        let mut grouped: HashMap<Uuid, Vec<Interaction>> = HashMap::new();
        for interaction in banded {
            grouped
                .entry(interaction.user_id)
                .or_default()
                .push(interaction.clone());
        }

        let mut neighbors: Vec<Neighbor> = grouped
            .into_iter()
            .map(|(user_id, ratings)| {
                let sum: f32 = ratings
                    .iter()
                    .filter_map(|interaction| interaction.rating)
                    .map(f32::from)
                    .sum();
                let mean = sum / ratings.len() as f32;
                Neighbor {
                    user_id,
                    mean,
                    ratings,
                }
            })
            .collect();

        neighbors.sort_by(|a, b| {
            (a.mean - target_mean)
                .abs()
                .total_cmp(&(b.mean - target_mean).abs())
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        neighbors.truncate(self.neighbor_limit);
        neighbors
    }
}

struct Neighbor {
    user_id: Uuid,
    mean: f32,
    ratings: Vec<Interaction>,
}
