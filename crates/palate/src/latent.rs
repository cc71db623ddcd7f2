//! Latent-factor rating prediction and ranking
//!
//! The factor model is trained offline and shipped as a serialized
//! artifact: per-user and per-item latent vectors plus bias means. It is
//! loaded once at startup and read-only thereafter, injected behind the
//! `RatingPredictor` trait so the ranker never depends on a concrete
//! backend. A missing or unreachable model degrades the ranker to an
//! empty candidate list; the blender then works with the remaining
//! generators.

use crate::store::{InteractionQuery, InteractionStore};
use crate::types::{Reason, ScoredCandidate};
use anyhow::{anyhow, Context};
use chrono::{Duration, Utc};
use dining_gateway_core::models::MenuItem;
use dining_gateway_core::types::Confidence;
use dining_gateway_core::{DiningGatewayError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Queryable rating model: `predict(user, item) -> rating`
pub trait RatingPredictor: Send + Sync {
    fn predict(&self, user_id: Uuid, item_id: Uuid) -> Result<f32>;
}

/// Offline-trained factor model with bias terms.
///
/// Prediction: `global_mean + (user_mean − global_mean) + (item_mean −
/// global_mean) + dot(user_factors, item_factors)`, clamped to [1, 5].
/// When either side is unknown to the model the prediction falls back to
/// the midpoint of the known means (or the global mean).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorModel {
    global_mean: f32,
    user_index: HashMap<Uuid, usize>,
    item_index: HashMap<Uuid, usize>,
    user_means: HashMap<Uuid, f32>,
    item_means: HashMap<Uuid, f32>,
    /// [num_users x factors]
    user_factors: Array2<f32>,
    /// [num_items x factors]
    item_factors: Array2<f32>,
}

/// Model artifact dimensions, exposed for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub users: usize,
    pub items: usize,
    pub factors: usize,
    pub global_mean: f32,
}

impl FactorModel {
    /// Assemble a model from per-user and per-item `(id, mean, factors)`
    /// rows. Every factor vector must have the same dimension.
    pub fn from_parts(
        global_mean: f32,
        users: Vec<(Uuid, f32, Vec<f32>)>,
        items: Vec<(Uuid, f32, Vec<f32>)>,
    ) -> Result<Self> {
        let factors = users
            .first()
            .map(|(_, _, f)| f.len())
            .or_else(|| items.first().map(|(_, _, f)| f.len()))
            .unwrap_or(0);

        let build = |rows: Vec<(Uuid, f32, Vec<f32>)>| -> Result<(
            HashMap<Uuid, usize>,
            HashMap<Uuid, f32>,
            Array2<f32>,
        )> {
            let mut index = HashMap::with_capacity(rows.len());
            let mut means = HashMap::with_capacity(rows.len());
            let mut flat = Vec::with_capacity(rows.len() * factors);
            for (position, (id, mean, vector)) in rows.into_iter().enumerate() {
                if vector.len() != factors {
                    return Err(DiningGatewayError::Internal(format!(
                        "factor dimension mismatch: expected {}, got {}",
                        factors,
                        vector.len()
                    )));
                }
                index.insert(id, position);
                means.insert(id, mean);
                flat.extend(vector);
            }
            let rows_count = index.len();
            let matrix = Array2::from_shape_vec((rows_count, factors), flat)
                .map_err(|e| DiningGatewayError::Internal(e.to_string()))?;
            Ok((index, means, matrix))
        };

        let (user_index, user_means, user_factors) = build(users)?;
        let (item_index, item_means, item_factors) = build(items)?;

        Ok(Self {
            global_mean,
            user_index,
            item_index,
            user_means,
            item_means,
            user_factors,
            item_factors,
        })
    }

    /// Load a serialized model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let start = std::time::Instant::now();
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            DiningGatewayError::model_unavailable(format!(
                "cannot read model artifact {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let model: FactorModel = bincode::deserialize(&bytes).map_err(|e| {
            DiningGatewayError::model_unavailable(format!("cannot decode model artifact: {}", e))
        })?;

        let info = model.info();
        info!(
            "Factor model loaded in {:.2}s ({} users, {} items, {} factors)",
            start.elapsed().as_secs_f64(),
            info.users,
            info.items,
            info.factors
        );
        Ok(model)
    }

    /// Serialize the model artifact to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| DiningGatewayError::Internal(format!("cannot encode model: {}", e)))?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            DiningGatewayError::Internal(format!(
                "cannot write model artifact {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Load from the path in `PALATE_MODEL_PATH`
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("PALATE_MODEL_PATH")
            .unwrap_or_else(|_| "/models/palate_factors.bin".to_string());
        Self::load(path)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            users: self.user_index.len(),
            items: self.item_index.len(),
            factors: self.user_factors.ncols().max(self.item_factors.ncols()),
            global_mean: self.global_mean,
        }
    }

    fn user_mean(&self, user_id: Uuid) -> f32 {
        self.user_means
            .get(&user_id)
            .copied()
            .unwrap_or(self.global_mean)
    }

    fn item_mean(&self, item_id: Uuid) -> f32 {
        self.item_means
            .get(&item_id)
            .copied()
            .unwrap_or(self.global_mean)
    }
}

impl RatingPredictor for FactorModel {
    fn predict(&self, user_id: Uuid, item_id: Uuid) -> Result<f32> {
        let user_mean = self.user_mean(user_id);
        let item_mean = self.item_mean(item_id);

        match (self.user_index.get(&user_id), self.item_index.get(&item_id)) {
            (Some(&u), Some(&i)) => {
                let dot = self.user_factors.row(u).dot(&self.item_factors.row(i));
                let predicted = self.global_mean
                    + (user_mean - self.global_mean)
                    + (item_mean - self.global_mean)
                    + dot;
                Ok(predicted.clamp(1.0, 5.0))
            }
            // Unknown user or item: midpoint of the available means
            _ => Ok(((user_mean + item_mean) / 2.0).clamp(1.0, 5.0)),
        }
    }
}

/// Ranks candidate items by predicted rating
pub struct LatentFactorRanker {
    predictor: Option<Arc<dyn RatingPredictor>>,
    interactions: Arc<dyn InteractionStore>,
    history_window: Duration,
}

impl LatentFactorRanker {
    pub fn new(
        predictor: Option<Arc<dyn RatingPredictor>>,
        interactions: Arc<dyn InteractionStore>,
        history_window: Duration,
    ) -> Self {
        Self {
            predictor,
            interactions,
            history_window,
        }
    }

    /// Score the candidate set and keep the top `count`.
    ///
    /// Never fails: a missing model or a prediction error degrades to an
    /// empty list so the blender can continue with the other generators.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        candidates: &[MenuItem],
        count: usize,
    ) -> Vec<ScoredCandidate> {
        if count == 0 {
            return Vec::new();
        }
        match self.try_recommend(user_id, candidates, count).await {
            Ok(scored) => scored,
            Err(error) => {
                warn!(%user_id, %error, "latent-factor ranker degraded to empty");
                Vec::new()
            }
        }
    }

    async fn try_recommend(
        &self,
        user_id: Uuid,
        candidates: &[MenuItem],
        count: usize,
    ) -> anyhow::Result<Vec<ScoredCandidate>> {
        let predictor = self
            .predictor
            .as_ref()
            .ok_or_else(|| anyhow!("no latent-factor model configured"))?;

        let confidence = self.user_confidence(user_id).await?;

        let mut scored = Vec::with_capacity(candidates.len());
        for item in candidates {
            let predicted = predictor
                .predict(user_id, item.id)
                .context("rating prediction failed")?;
            scored.push(ScoredCandidate::new(
                item.id,
                predicted,
                Reason::Svd,
                confidence,
            ));
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(count);
        Ok(scored)
    }

    /// Confidence grows with the user's interaction volume in the window
    async fn user_confidence(&self, user_id: Uuid) -> anyhow::Result<Confidence> {
        let since = Utc::now() - self.history_window;
        let count = self
            .interactions
            .count(&InteractionQuery::for_user(user_id).since(since))
            .await?;
        Ok(match count {
            0..=4 => Confidence::Low,
            5..=14 => Confidence::Medium,
            _ => Confidence::High,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(user: Uuid, item: Uuid) -> FactorModel {
        FactorModel::from_parts(
            4.0,
            vec![(user, 4.5, vec![0.5, 0.0, 0.2])],
            vec![(item, 3.5, vec![0.4, 0.1, 0.0])],
        )
        .unwrap()
    }

    #[test]
    fn test_predict_known_pair() {
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();
        let model = model(user, item);

        // 4.0 + (4.5 - 4.0) + (3.5 - 4.0) + dot([0.5, 0, 0.2], [0.4, 0.1, 0]) = 4.2
        let predicted = model.predict(user, item).unwrap();
        assert!((predicted - 4.2).abs() < 1e-5);
    }

    #[test]
    fn test_predict_unknown_item_uses_mean_midpoint() {
        let user = Uuid::new_v4();
        let model = model(user, Uuid::new_v4());

        // (user_mean 4.5 + global 4.0) / 2
        let predicted = model.predict(user, Uuid::new_v4()).unwrap();
        assert!((predicted - 4.25).abs() < 1e-5);
    }

    #[test]
    fn test_predict_unknown_pair_is_global_mean() {
        let model = model(Uuid::new_v4(), Uuid::new_v4());
        let predicted = model.predict(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert!((predicted - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_predict_clamped_to_rating_range() {
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();
        let model = FactorModel::from_parts(
            4.8,
            vec![(user, 5.0, vec![2.0, 2.0])],
            vec![(item, 5.0, vec![2.0, 2.0])],
        )
        .unwrap();

        assert_eq!(model.predict(user, item).unwrap(), 5.0);
    }

    #[test]
    fn test_from_parts_rejects_ragged_factors() {
        let result = FactorModel::from_parts(
            4.0,
            vec![
                (Uuid::new_v4(), 4.0, vec![0.1, 0.2]),
                (Uuid::new_v4(), 4.0, vec![0.1]),
            ],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_artifact_round_trip() {
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();
        let model = model(user, item);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factors.bin");
        model.save(&path).unwrap();

        let loaded = FactorModel::load(&path).unwrap();
        assert_eq!(loaded.info(), model.info());
        assert!(
            (loaded.predict(user, item).unwrap() - model.predict(user, item).unwrap()).abs()
                < 1e-6
        );
    }

    #[test]
    fn test_load_missing_artifact_is_model_unavailable() {
        let result = FactorModel::load("/nonexistent/factors.bin");
        assert!(matches!(
            result,
            Err(DiningGatewayError::ModelUnavailable { .. })
        ));
    }
}
