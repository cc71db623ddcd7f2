//! Palate Hybrid Food-Recommendation Engine
//!
//! This crate implements the personalization layer for Dining Gateway:
//! preference profiling, four candidate generators (latent-factor,
//! neighbor-based collaborative, content-based, popularity), weighted
//! hybrid blending with confidence fusion, a TTL snapshot cache, and the
//! offline evaluation harness.

pub mod blend;
pub mod cache;
pub mod collaborative;
pub mod content_based;
pub mod evaluation;
pub mod latent;
pub mod popularity;
pub mod preference;
pub mod recommendation;
pub mod store;
pub mod types;

// Re-export key types
pub use blend::{blend, generator_quotas, GeneratorOutputs, GeneratorQuotas};
pub use cache::RecommendationCache;
pub use collaborative::CollaborativeRanker;
pub use content_based::ContentBasedRanker;
pub use evaluation::{
    AccuracyGrade, DataStats, EvaluationMetrics, EvaluationReport, TestPeriod,
};
pub use latent::{FactorModel, LatentFactorRanker, ModelInfo, RatingPredictor};
pub use popularity::PopularityRanker;
pub use preference::{PreferenceAnalyzer, PreferenceProfile};
pub use recommendation::{EngineAnalytics, RecommendationService};
pub use store::{
    AvailabilityFilter, Catalog, InMemoryCatalog, InMemoryInteractionStore, InteractionQuery,
    InteractionStore, ItemFilter, ItemSort, PgCatalog, PgInteractionStore,
};
pub use types::{
    AlgorithmBreakdown, BlendAlgorithm, Reason, RecommendationSnapshot, ScoredCandidate,
};

/// Palate engine configuration
#[derive(Debug, Clone)]
pub struct PalateConfig {
    /// Interaction lookback window in days (default: 30)
    pub history_window_days: i64,
    /// Snapshot cache time-to-live in seconds (default: 3600)
    pub cache_ttl_seconds: i64,
    /// Neighbors considered by the collaborative ranker (default: 10)
    pub neighbor_limit: usize,
    /// Rating band half-width for neighbor selection (default: 0.5)
    pub rating_tolerance: f32,
    /// Minimum rating treated as "liked" (default: 4)
    pub liked_rating_threshold: u8,
    /// Latent-factor model artifact path (default: from env PALATE_MODEL_PATH)
    pub model_path: Option<String>,
}

impl Default for PalateConfig {
    fn default() -> Self {
        Self {
            history_window_days: 30,
            cache_ttl_seconds: 3600,
            neighbor_limit: 10,
            rating_tolerance: 0.5,
            liked_rating_threshold: 4,
            model_path: None,
        }
    }
}

#[cfg(test)]
mod tests;
