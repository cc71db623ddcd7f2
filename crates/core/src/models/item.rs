//! Menu item model and rolling rating statistics

use crate::types::{DietaryTag, SpiceLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A catalog menu item with static attributes and rolling rating statistics
///
/// `popularity_score` is derived: `average_rating × ln(total_ratings + 1)`.
/// It is recomputed whenever a new rating interaction lands, never written
/// independently of the rating statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MenuItem {
    pub id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub description: String,

    /// Price in USD cents
    #[validate(range(min = 0))]
    pub price_cents: i32,

    #[validate(length(min = 1, max = 100))]
    pub category: String,

    #[validate(length(min = 1, max = 100))]
    pub cuisine: String,

    pub spice_level: SpiceLevel,

    pub dietary_tags: Vec<DietaryTag>,

    /// Typical preparation time in minutes
    pub preparation_minutes: u32,

    pub availability: bool,

    #[validate(range(min = 0.0, max = 5.0))]
    pub average_rating: f32,

    pub total_ratings: u32,

    pub popularity_score: f32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Ratings-volume-aware popularity signal: `avg × ln(count + 1)`
    pub fn compute_popularity(average_rating: f32, total_ratings: u32) -> f32 {
        average_rating * ((total_ratings + 1) as f32).ln()
    }

    /// Statistics after folding in one new rating (incremental mean)
    pub fn stats_with_rating(&self, rating: u8) -> ItemStats {
        let old_count = self.total_ratings as f32;
        let new_count = self.total_ratings + 1;
        let new_average = (self.average_rating * old_count + rating as f32) / new_count as f32;
        ItemStats {
            average_rating: new_average,
            total_ratings: new_count,
            popularity_score: Self::compute_popularity(new_average, new_count),
        }
    }
}

/// Rolling rating statistics written back to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    pub average_rating: f32,
    pub total_ratings: u32,
    pub popularity_score: f32,
}
