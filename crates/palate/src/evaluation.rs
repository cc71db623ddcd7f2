//! Offline evaluation harness
//!
//! Measures ranking quality against a held-out interaction slice:
//! train/test split with a one-day gap, per-user recommendation generation
//! through the uncached production pipeline, and information-retrieval
//! metrics aggregated across users. Runs are read-only: they never touch
//! the interaction store, catalog statistics, or the snapshot cache.

use crate::recommendation::RecommendationService;
use crate::store::{Catalog, InteractionQuery, InteractionStore};
use chrono::{DateTime, Duration, Utc};
use dining_gateway_core::models::{Interaction, MenuItem};
use dining_gateway_core::{DiningGatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

/// Top-K used for precision, recall, NDCG, hit rate, and diversity
pub const RANKING_K: usize = 10;
/// Top-K used for catalog coverage
pub const COVERAGE_K: usize = 20;

/// Aggregated metric values, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1_score: f32,
    pub ndcg: f32,
    pub hit_rate: f32,
    pub coverage: f32,
    pub diversity: f32,
    /// Mean of precision, recall, NDCG, and hit rate
    pub overall_accuracy: f32,
}

/// Evaluation window boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
}

/// Input-volume statistics for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStats {
    pub training_interactions: u64,
    pub test_interactions: u64,
    pub unique_users: u64,
    pub unique_items: u64,
}

/// Letter grade over the overall accuracy score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
}

impl AccuracyGrade {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.9 {
            AccuracyGrade::APlus
        } else if score >= 0.8 {
            AccuracyGrade::A
        } else if score >= 0.7 {
            AccuracyGrade::BPlus
        } else if score >= 0.6 {
            AccuracyGrade::B
        } else if score >= 0.5 {
            AccuracyGrade::CPlus
        } else if score >= 0.4 {
            AccuracyGrade::C
        } else {
            AccuracyGrade::D
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AccuracyGrade::APlus => "Excellent",
            AccuracyGrade::A => "Very Good",
            AccuracyGrade::BPlus => "Good",
            AccuracyGrade::B => "Above Average",
            AccuracyGrade::CPlus => "Average",
            AccuracyGrade::C => "Below Average",
            AccuracyGrade::D => "Needs Improvement",
        }
    }
}

/// Full result of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metrics: EvaluationMetrics,
    pub grade: AccuracyGrade,
    pub test_period: TestPeriod,
    pub data_stats: DataStats,
}

/// One evaluated user's recommendations and held-out truth
struct UserEval {
    user_id: Uuid,
    ranked: Vec<Uuid>,
    coverage: Vec<Uuid>,
    ratings: HashMap<Uuid, u8>,
    liked: HashSet<Uuid>,
}

pub(crate) async fn run(
    service: &RecommendationService,
    target_user: Option<Uuid>,
    test_period_days: i64,
) -> Result<EvaluationReport> {
    let end = Utc::now();
    let start = end - Duration::days(test_period_days);
    // One-day gap between training and test data to avoid leakage
    let training_cutoff = start - Duration::days(1);

    let scope = |query: InteractionQuery| match target_user {
        Some(user_id) => InteractionQuery {
            user_id: Some(user_id),
            ..query
        },
        None => query,
    };

    let training_interactions = service
        .interactions()
        .count(&scope(InteractionQuery::default().until(training_cutoff)))
        .await?;

    let test_interactions = service
        .interactions()
        .query(&scope(InteractionQuery::default().since(start).rated_only()))
        .await?;

    if test_interactions.is_empty() {
        return Err(DiningGatewayError::InsufficientTestData {
            test_period_days,
            training_interactions,
        });
    }

    let mut by_user: BTreeMap<Uuid, Vec<Interaction>> = BTreeMap::new();
    for interaction in &test_interactions {
        by_user
            .entry(interaction.user_id)
            .or_default()
            .push(interaction.clone());
    }

    let unique_items: HashSet<Uuid> = test_interactions
        .iter()
        .map(|interaction| interaction.item_id)
        .collect();
    let data_stats = DataStats {
        training_interactions,
        test_interactions: test_interactions.len() as u64,
        unique_users: by_user.len() as u64,
        unique_items: unique_items.len() as u64,
    };

    let liked_threshold = service.liked_rating_threshold();
    let mut evals: Vec<UserEval> = Vec::with_capacity(by_user.len());

    for (user_id, events) in by_user {
        let ratings: HashMap<Uuid, u8> = events
            .iter()
            .filter_map(|event| event.rating.map(|rating| (event.item_id, rating)))
            .collect();
        let liked: HashSet<Uuid> = ratings
            .iter()
            .filter(|(_, rating)| **rating >= liked_threshold)
            .map(|(item_id, _)| *item_id)
            .collect();

        // Same code path as serving, never the cache
        let ranked = generate_ids(service, user_id, RANKING_K).await;
        let coverage = generate_ids(service, user_id, COVERAGE_K).await;

        evals.push(UserEval {
            user_id,
            ranked,
            coverage,
            ratings,
            liked,
        });
    }

    let precision = mean(
        evals
            .iter()
            .filter(|eval| !eval.ranked.is_empty())
            .map(|eval| precision_at_k(&eval.ranked, &eval.liked)),
    );
    let recall = mean(
        evals
            .iter()
            .filter_map(|eval| recall_at_k(&eval.ranked, &eval.liked)),
    );
    let ndcg = mean(
        evals
            .iter()
            .map(|eval| ndcg_at_k(&eval.ranked, &eval.ratings, RANKING_K)),
    );
    let hit_rate = if evals.is_empty() {
        0.0
    } else {
        let hits = evals
            .iter()
            .filter(|eval| eval.ranked.iter().any(|id| eval.liked.contains(id)))
            .count();
        hits as f32 / evals.len() as f32
    };

    let coverage = match compute_coverage(service, &evals).await {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "coverage computation failed, reporting 0");
            0.0
        }
    };
    let diversity = match compute_diversity(service, &evals).await {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "diversity computation failed, reporting 0");
            0.0
        }
    };

    let f1_score = if precision > 0.0 && recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    let overall_accuracy = (precision + recall + ndcg + hit_rate) / 4.0;

    Ok(EvaluationReport {
        metrics: EvaluationMetrics {
            precision,
            recall,
            f1_score,
            ndcg,
            hit_rate,
            coverage,
            diversity,
            overall_accuracy,
        },
        grade: AccuracyGrade::from_score(overall_accuracy),
        test_period: TestPeriod {
            start,
            end,
            days: test_period_days,
        },
        data_stats,
    })
}

/// Generate top-`count` item ids through the uncached pipeline; a failed
/// generation contributes an empty list rather than aborting the run.
async fn generate_ids(service: &RecommendationService, user_id: Uuid, count: usize) -> Vec<Uuid> {
    match service.generate(user_id, count).await {
        Ok(snapshot) => snapshot
            .items
            .iter()
            .map(|candidate| candidate.item_id)
            .collect(),
        Err(error) => {
            warn!(%user_id, %error, "recommendation generation failed during evaluation");
            Vec::new()
        }
    }
}

/// Distinct recommended items across all users over the available catalog
async fn compute_coverage(
    service: &RecommendationService,
    evals: &[UserEval],
) -> Result<f32> {
    let available = service.catalog().count_available().await?;
    if available == 0 {
        return Ok(0.0);
    }
    let recommended: HashSet<Uuid> = evals
        .iter()
        .flat_map(|eval| eval.coverage.iter().copied())
        .collect();
    Ok(recommended.len() as f32 / available as f32)
}

/// Mean per-user attribute diversity of the top-ranked items
async fn compute_diversity(
    service: &RecommendationService,
    evals: &[UserEval],
) -> Result<f32> {
    let mut scores = Vec::new();
    for eval in evals {
        if eval.ranked.is_empty() {
            continue;
        }
        let items = service.catalog().find_items_by_ids(&eval.ranked).await?;
        if items.is_empty() {
            warn!(user_id = %eval.user_id, "no catalog items found for diversity scoring");
            continue;
        }
        scores.push(diversity_score(&items));
    }
    Ok(mean(scores))
}

fn mean(values: impl IntoIterator<Item = f32>) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for value in values {
        sum += value;
        count += 1;
    }
    if count > 0 {
        sum / count as f32
    } else {
        0.0
    }
}

/// Fraction of recommended items that were liked; 0 for an empty list
pub fn precision_at_k(recommended: &[Uuid], liked: &HashSet<Uuid>) -> f32 {
    if recommended.is_empty() {
        return 0.0;
    }
    let hits = recommended.iter().filter(|id| liked.contains(id)).count();
    hits as f32 / recommended.len() as f32
}

/// Fraction of liked items captured by the recommendations; `None` when
/// the user liked nothing in the test window (excluded from the average)
pub fn recall_at_k(recommended: &[Uuid], liked: &HashSet<Uuid>) -> Option<f32> {
    if liked.is_empty() {
        return None;
    }
    let hits = recommended.iter().filter(|id| liked.contains(id)).count();
    Some(hits as f32 / liked.len() as f32)
}

/// Normalized discounted cumulative gain at `k`.
///
/// Relevance is the test-period rating of each recommended item (0 when
/// not rated); the ideal ordering is the test ratings sorted descending.
pub fn ndcg_at_k(recommended: &[Uuid], ratings: &HashMap<Uuid, u8>, k: usize) -> f32 {
    let dcg: f32 = recommended
        .iter()
        .take(k)
        .enumerate()
        .map(|(position, item_id)| {
            let relevance = ratings.get(item_id).copied().unwrap_or(0) as f32;
            relevance / ((position + 2) as f32).log2()
        })
        .sum();

    let mut ideal: Vec<u8> = ratings.values().copied().collect();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg: f32 = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(position, rating)| *rating as f32 / ((position + 2) as f32).log2())
        .sum();

    if idcg > 0.0 {
        dcg / idcg
    } else {
        0.0
    }
}

/// Attribute spread of a recommendation list: distinct categories plus
/// distinct cuisines over twice the list length, capped at 1
pub fn diversity_score(items: &[MenuItem]) -> f32 {
    if items.is_empty() {
        return 0.0;
    }
    let categories: HashSet<&str> = items.iter().map(|item| item.category.as_str()).collect();
    let cuisines: HashSet<&str> = items.iter().map(|item| item.cuisine.as_str()).collect();
    let spread = (categories.len() + cuisines.len()) as f32 / (2 * items.len()) as f32;
    spread.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(AccuracyGrade::from_score(0.95), AccuracyGrade::APlus);
        assert_eq!(AccuracyGrade::from_score(0.9), AccuracyGrade::APlus);
        assert_eq!(AccuracyGrade::from_score(0.85), AccuracyGrade::A);
        assert_eq!(AccuracyGrade::from_score(0.75), AccuracyGrade::BPlus);
        assert_eq!(AccuracyGrade::from_score(0.65), AccuracyGrade::B);
        assert_eq!(AccuracyGrade::from_score(0.55), AccuracyGrade::CPlus);
        assert_eq!(AccuracyGrade::from_score(0.45), AccuracyGrade::C);
        assert_eq!(AccuracyGrade::from_score(0.1), AccuracyGrade::D);
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean(Vec::<f32>::new()), 0.0);
    }
}
