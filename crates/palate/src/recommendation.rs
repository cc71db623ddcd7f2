//! Recommendation serving facade
//!
//! Wires the preference analyzer, the four candidate generators, the
//! hybrid blender, and the snapshot cache into the caller-facing
//! operations: `get_recommendations`, `record_interaction`,
//! `user_history`, `analytics`, and `evaluate`.

use crate::blend::{blend, generator_quotas, popularity_passthrough, GeneratorOutputs};
use crate::cache::RecommendationCache;
use crate::collaborative::CollaborativeRanker;
use crate::content_based::ContentBasedRanker;
use crate::evaluation::{self, EvaluationReport};
use crate::latent::{FactorModel, LatentFactorRanker, RatingPredictor};
use crate::popularity::PopularityRanker;
use crate::preference::{PreferenceAnalyzer, PreferenceProfile};
use crate::store::{Catalog, InteractionQuery, InteractionStore, ItemFilter};
use crate::types::{AlgorithmBreakdown, BlendAlgorithm, RecommendationSnapshot, ScoredCandidate};
use crate::PalateConfig;
use chrono::{Duration, Utc};
use dining_gateway_core::models::{Interaction, NewInteraction};
use dining_gateway_core::types::InteractionKind;
use dining_gateway_core::validation::{validate_new_interaction, validate_recommendation_count};
use dining_gateway_core::{DiningGatewayError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Interaction-volume summary across the whole store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineAnalytics {
    pub total_users: u64,
    pub total_interactions: u64,
    pub avg_interactions_per_user: f32,
}

/// The hybrid recommendation engine facade.
///
/// Generators run concurrently per request and the blender waits on all of
/// them (join barrier). Generator failures are recovered locally as empty
/// lists; a request only fails on validation, store, or cache errors.
pub struct RecommendationService {
    catalog: Arc<dyn Catalog>,
    interactions: Arc<dyn InteractionStore>,
    analyzer: PreferenceAnalyzer,
    latent: LatentFactorRanker,
    collaborative: CollaborativeRanker,
    content: ContentBasedRanker,
    popularity: PopularityRanker,
    cache: RecommendationCache,
    config: PalateConfig,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        interactions: Arc<dyn InteractionStore>,
        predictor: Option<Arc<dyn RatingPredictor>>,
        config: PalateConfig,
    ) -> Self {
        let history_window = Duration::days(config.history_window_days);
        Self {
            analyzer: PreferenceAnalyzer::new(Arc::clone(&catalog), Arc::clone(&interactions)),
            latent: LatentFactorRanker::new(predictor, Arc::clone(&interactions), history_window),
            collaborative: CollaborativeRanker::new(
                Arc::clone(&catalog),
                Arc::clone(&interactions),
                config.neighbor_limit,
                config.rating_tolerance,
                config.liked_rating_threshold,
            ),
            content: ContentBasedRanker::new(Arc::clone(&catalog)),
            popularity: PopularityRanker::new(Arc::clone(&catalog)),
            cache: RecommendationCache::new(Duration::seconds(config.cache_ttl_seconds)),
            catalog,
            interactions,
            config,
        }
    }

    /// Load the factor model named by the configuration (or the
    /// `PALATE_MODEL_PATH` environment variable).
    ///
    /// An unavailable model is not fatal: the engine runs without the
    /// latent-factor generator and the blender degrades to the remaining
    /// three.
    pub fn load_predictor(config: &PalateConfig) -> Option<Arc<dyn RatingPredictor>> {
        let loaded = match config.model_path.as_deref() {
            Some(path) => FactorModel::load(path),
            None => FactorModel::from_env(),
        };
        match loaded {
            Ok(model) => Some(Arc::new(model)),
            Err(error) => {
                warn!(%error, "latent-factor model unavailable, continuing without it");
                None
            }
        }
    }

    /// Ranked recommendations for a user, served read-through from the
    /// snapshot cache.
    pub async fn get_recommendations(
        &self,
        user_id: Uuid,
        count: usize,
    ) -> Result<RecommendationSnapshot> {
        validate_recommendation_count(count)?;

        if let Some(snapshot) = self.cache.get_fresh(user_id) {
            debug!(%user_id, "serving cached recommendations");
            return Ok(snapshot);
        }

        let snapshot = self.generate(user_id, count).await?;
        self.cache.insert(snapshot.clone());
        Ok(snapshot)
    }

    /// Run the full pipeline without touching the cache.
    ///
    /// The evaluation harness calls this path so offline runs exercise the
    /// exact serving code without polluting (or reading) cached snapshots.
    pub(crate) async fn generate(
        &self,
        user_id: Uuid,
        count: usize,
    ) -> Result<RecommendationSnapshot> {
        let window = Duration::days(self.config.history_window_days);
        let profile = self.analyzer.analyze(user_id, window).await?;

        if profile.is_new_user() {
            info!(%user_id, "new user, serving popularity-based recommendations");
            let items = popularity_passthrough(self.popularity.recommend(count).await);
            let breakdown = AlgorithmBreakdown {
                popularity: items.len(),
                ..AlgorithmBreakdown::default()
            };
            let algorithm = if items.is_empty() {
                BlendAlgorithm::Fallback
            } else {
                BlendAlgorithm::Popularity
            };
            return Ok(self.snapshot(user_id, items, algorithm, breakdown, true));
        }

        let quotas = generator_quotas(count);
        let candidates = self.catalog.find_items(&ItemFilter::available()).await?;

        // Generators are independent reads; the blender needs all four
        let (svd, collaborative, content, popularity) = tokio::join!(
            self.latent.recommend(user_id, &candidates, quotas.svd),
            self.collaborative
                .recommend(user_id, &profile, quotas.collaborative),
            self.content.recommend(&profile, quotas.content),
            self.popularity.recommend(quotas.popularity),
        );

        let outputs = GeneratorOutputs {
            svd,
            collaborative,
            content,
            popularity,
        };
        let breakdown = outputs.breakdown();
        let items = blend(outputs, count);

        let algorithm = if items.is_empty() {
            warn!(%user_id, "no generator produced candidates, returning empty snapshot");
            BlendAlgorithm::Fallback
        } else {
            BlendAlgorithm::HybridSvd
        };

        Ok(self.snapshot(user_id, items, algorithm, breakdown, false))
    }

    fn snapshot(
        &self,
        user_id: Uuid,
        items: Vec<ScoredCandidate>,
        algorithm: BlendAlgorithm,
        breakdown: AlgorithmBreakdown,
        new_user: bool,
    ) -> RecommendationSnapshot {
        RecommendationSnapshot {
            user_id,
            items,
            algorithm,
            breakdown,
            new_user,
            generated_at: Utc::now(),
            ttl_seconds: self.cache.ttl_seconds(),
            cached: false,
        }
    }

    /// Record a user-item interaction.
    ///
    /// Rating interactions additionally fold the rating into the item's
    /// rolling statistics (incremental mean + popularity recompute); the
    /// catalog adapter keeps that read-modify-write atomic per item.
    pub async fn record_interaction(&self, input: NewInteraction) -> Result<Interaction> {
        validate_new_interaction(&input)?;

        let item = self
            .catalog
            .find_item(input.item_id)
            .await?
            .ok_or_else(|| DiningGatewayError::not_found("menu item"))?;

        let interaction = input.into_interaction(Utc::now());
        self.interactions.append(interaction.clone()).await?;

        if interaction.kind == InteractionKind::Rating {
            if let Some(rating) = interaction.rating {
                let stats = self.catalog.apply_rating(item.id, rating).await?;
                debug!(
                    item_id = %item.id,
                    average_rating = stats.average_rating,
                    total_ratings = stats.total_ratings,
                    "updated item rating statistics"
                );
            }
        }

        Ok(interaction)
    }

    /// A user's interaction window plus the preference profile derived
    /// from it.
    pub async fn user_history(
        &self,
        user_id: Uuid,
        days: i64,
    ) -> Result<(Vec<Interaction>, PreferenceProfile)> {
        let since = Utc::now() - Duration::days(days);
        let events = self
            .interactions
            .query(&InteractionQuery::for_user(user_id).since(since))
            .await?;
        let profile = self.analyzer.profile_from(user_id, &events).await?;
        Ok((events, profile))
    }

    /// Interaction-volume summary
    pub async fn analytics(&self) -> Result<EngineAnalytics> {
        let total_interactions = self.interactions.count(&InteractionQuery::default()).await?;
        let total_users = self
            .interactions
            .distinct_users(&InteractionQuery::default())
            .await?
            .len() as u64;
        let avg_interactions_per_user = if total_users > 0 {
            total_interactions as f32 / total_users as f32
        } else {
            0.0
        };
        Ok(EngineAnalytics {
            total_users,
            total_interactions,
            avg_interactions_per_user,
        })
    }

    /// Offline accuracy evaluation over a held-out test window
    pub async fn evaluate(
        &self,
        user_id: Option<Uuid>,
        test_period_days: i64,
    ) -> Result<EvaluationReport> {
        evaluation::run(self, user_id, test_period_days).await
    }

    pub(crate) fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub(crate) fn interactions(&self) -> &Arc<dyn InteractionStore> {
        &self.interactions
    }

    pub(crate) fn liked_rating_threshold(&self) -> u8 {
        self.config.liked_rating_threshold
    }
}
