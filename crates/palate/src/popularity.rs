//! Popularity ranking: cold-start and fallback candidate source
//!
//! Queries available items by popularity and degrades through an explicit
//! ordered chain of looser availability filters; each step has an "empty
//! means try next" contract. Only when the whole chain is exhausted does
//! the ranker return nothing (empty catalog).

use crate::store::{AvailabilityFilter, Catalog, ItemFilter, ItemSort};
use crate::types::{Reason, ScoredCandidate};
use dining_gateway_core::models::MenuItem;
use dining_gateway_core::types::Confidence;
use std::sync::Arc;
use tracing::{debug, warn};

/// Score assigned to items without any ratings yet
const UNRATED_DEFAULT_SCORE: f32 = 4.0;

pub struct PopularityRanker {
    catalog: Arc<dyn Catalog>,
}

impl PopularityRanker {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// The availability degradation chain, tried in order
    fn fallback_chain(count: usize) -> [ItemFilter; 3] {
        [
            ItemFilter::available()
                .with_sort(ItemSort::Popularity)
                .with_limit(count),
            ItemFilter::available()
                .with_availability(AvailabilityFilter::Loose)
                .with_sort(ItemSort::Rating)
                .with_limit(count),
            ItemFilter::available()
                .with_availability(AvailabilityFilter::Any)
                .with_sort(ItemSort::RatingRecency)
                .with_limit(count),
        ]
    }

    /// Top `count` items by popularity.
    ///
    /// Never fails: any catalog error degrades to an empty list.
    pub async fn recommend(&self, count: usize) -> Vec<ScoredCandidate> {
        if count == 0 {
            return Vec::new();
        }
        match self.try_recommend(count).await {
            Ok(scored) => scored,
            Err(error) => {
                warn!(%error, "popularity ranker degraded to empty");
                Vec::new()
            }
        }
    }

    async fn try_recommend(&self, count: usize) -> anyhow::Result<Vec<ScoredCandidate>> {
        for (step, filter) in Self::fallback_chain(count).into_iter().enumerate() {
            let items = self.catalog.find_items(&filter).await?;
            if items.is_empty() {
                continue;
            }
            if step > 0 {
                debug!(step, "popularity ranker used fallback filter");
            }
            return Ok(items.iter().map(Self::to_candidate).collect());
        }
        Ok(Vec::new())
    }

    fn to_candidate(item: &MenuItem) -> ScoredCandidate {
        let score = if item.average_rating > 0.0 {
            item.average_rating
        } else {
            UNRATED_DEFAULT_SCORE
        };
        ScoredCandidate::new(item.id, score, Reason::Popularity, Confidence::Medium)
    }
}
