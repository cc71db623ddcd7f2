//! Candidate and snapshot types produced by the recommendation pipeline

use chrono::{DateTime, Duration, Utc};
use dining_gateway_core::types::Confidence;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which strategy produced (or dominated) a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Svd,
    Collaborative,
    Content,
    Popularity,
    /// More than one generator contributed to the blended score
    HybridMultiple,
}

/// Pipeline variant that produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendAlgorithm {
    /// Full four-generator blend
    HybridSvd,
    /// Cold-start popularity passthrough
    Popularity,
    /// Every generator came back empty
    Fallback,
}

/// A single scored recommendation candidate.
///
/// All four generators populate this same fixed shape; the blender merges
/// candidates sharing an item id. Scores are always clamped to [0, 5].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub item_id: Uuid,
    pub score: f32,
    pub reason: Reason,
    pub confidence: Confidence,
    /// Generator weight (accumulated across generators after blending);
    /// assigned by the blender, 0 on freshly generated candidates.
    pub source_weight: f32,
}

impl ScoredCandidate {
    pub fn new(item_id: Uuid, score: f32, reason: Reason, confidence: Confidence) -> Self {
        Self {
            item_id,
            score: score.clamp(0.0, 5.0),
            reason,
            confidence,
            source_weight: 0.0,
        }
    }
}

/// Per-generator candidate counts before blending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmBreakdown {
    pub svd: usize,
    pub collaborative: usize,
    pub content: usize,
    pub popularity: usize,
}

/// A blended, ranked recommendation list for one user.
///
/// Snapshots are cached per user and replayed verbatim (with `cached =
/// true`) until the TTL elapses; TTL expiry is the only invalidation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSnapshot {
    pub user_id: Uuid,
    pub items: Vec<ScoredCandidate>,
    pub algorithm: BlendAlgorithm,
    pub breakdown: AlgorithmBreakdown,
    pub new_user: bool,
    pub generated_at: DateTime<Utc>,
    pub ttl_seconds: i64,
    pub cached: bool,
}

impl RecommendationSnapshot {
    /// Whether the snapshot is still inside its TTL window
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.generated_at < Duration::seconds(self.ttl_seconds)
    }

    /// Mark as served from cache
    pub fn as_cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_clamped_to_range() {
        let high = ScoredCandidate::new(Uuid::new_v4(), 7.2, Reason::Svd, Confidence::High);
        assert_eq!(high.score, 5.0);

        let low = ScoredCandidate::new(Uuid::new_v4(), -1.0, Reason::Content, Confidence::Low);
        assert_eq!(low.score, 0.0);
    }

    #[test]
    fn test_snapshot_freshness() {
        let snapshot = RecommendationSnapshot {
            user_id: Uuid::new_v4(),
            items: Vec::new(),
            algorithm: BlendAlgorithm::HybridSvd,
            breakdown: AlgorithmBreakdown::default(),
            new_user: false,
            generated_at: Utc::now(),
            ttl_seconds: 3600,
            cached: false,
        };

        assert!(snapshot.is_fresh(snapshot.generated_at + Duration::seconds(3599)));
        assert!(!snapshot.is_fresh(snapshot.generated_at + Duration::seconds(3600)));
    }

    #[test]
    fn test_as_cached_sets_flag() {
        let snapshot = RecommendationSnapshot {
            user_id: Uuid::new_v4(),
            items: Vec::new(),
            algorithm: BlendAlgorithm::Popularity,
            breakdown: AlgorithmBreakdown::default(),
            new_user: true,
            generated_at: Utc::now(),
            ttl_seconds: 3600,
            cached: false,
        };

        assert!(snapshot.as_cached().cached);
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&Reason::HybridMultiple).unwrap();
        assert_eq!(json, "\"hybrid_multiple\"");
    }
}
