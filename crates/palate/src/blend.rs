//! Hybrid blending of generator outputs
//!
//! Merges the four candidate lists into one ranked, deduplicated list.
//! Items surfaced by several generators get a weighted-average score and a
//! fused confidence label; single-source items pass through unchanged.

use crate::types::{AlgorithmBreakdown, Reason, ScoredCandidate};
use dining_gateway_core::types::Confidence;
use std::collections::HashMap;
use uuid::Uuid;

pub const SVD_WEIGHT: f32 = 0.5;
pub const COLLABORATIVE_WEIGHT: f32 = 0.25;
pub const CONTENT_WEIGHT: f32 = 0.20;
pub const POPULARITY_WEIGHT: f32 = 0.05;

/// Per-generator candidate counts requested for a total of `count` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorQuotas {
    pub svd: usize,
    pub collaborative: usize,
    pub content: usize,
    pub popularity: usize,
}

/// Fixed proportions of the requested count: SVD 50%, collaborative 25%,
/// content 20%, popularity 5%, each rounded up. Generators may return
/// fewer.
pub fn generator_quotas(count: usize) -> GeneratorQuotas {
    let share = |fraction: f64| (count as f64 * fraction).ceil() as usize;
    GeneratorQuotas {
        svd: share(0.5),
        collaborative: share(0.25),
        content: share(0.2),
        popularity: share(0.05),
    }
}

/// The four generator outputs awaiting blending
#[derive(Debug, Clone, Default)]
pub struct GeneratorOutputs {
    pub svd: Vec<ScoredCandidate>,
    pub collaborative: Vec<ScoredCandidate>,
    pub content: Vec<ScoredCandidate>,
    pub popularity: Vec<ScoredCandidate>,
}

impl GeneratorOutputs {
    pub fn breakdown(&self) -> AlgorithmBreakdown {
        AlgorithmBreakdown {
            svd: self.svd.len(),
            collaborative: self.collaborative.len(),
            content: self.content.len(),
            popularity: self.popularity.len(),
        }
    }
}

struct Grouped {
    item_id: Uuid,
    weighted_sum: f32,
    total_weight: f32,
    first: ScoredCandidate,
    reasons: Vec<Reason>,
    confidences: Vec<Confidence>,
}

/// Merge generator outputs into the final ranked list of at most `count`
/// candidates.
///
/// Multi-source items score `Σ(score × weight) / Σ(weight)` with
/// confidence fused as the rounded ordinal mean and reason
/// `hybrid_multiple`; single-source items keep their original score,
/// reason, and confidence. Order is strictly non-increasing by score, ties
/// broken by first-seen order.
pub fn blend(outputs: GeneratorOutputs, count: usize) -> Vec<ScoredCandidate> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut grouped: HashMap<Uuid, Grouped> = HashMap::new();

    let sources: [(Vec<ScoredCandidate>, f32); 4] = [
        (outputs.svd, SVD_WEIGHT),
        (outputs.collaborative, COLLABORATIVE_WEIGHT),
        (outputs.content, CONTENT_WEIGHT),
        (outputs.popularity, POPULARITY_WEIGHT),
    ];

    for (candidates, weight) in sources {
        for candidate in candidates {
            match grouped.get_mut(&candidate.item_id) {
                Some(entry) => {
                    entry.weighted_sum += candidate.score * weight;
                    entry.total_weight += weight;
                    entry.reasons.push(candidate.reason);
                    entry.confidences.push(candidate.confidence);
                }
                None => {
                    order.push(candidate.item_id);
                    grouped.insert(
                        candidate.item_id,
                        Grouped {
                            item_id: candidate.item_id,
                            weighted_sum: candidate.score * weight,
                            total_weight: weight,
                            reasons: vec![candidate.reason],
                            confidences: vec![candidate.confidence],
                            first: candidate,
                        },
                    );
                }
            }
        }
    }

    let mut blended: Vec<ScoredCandidate> = order
        .into_iter()
        .filter_map(|id| grouped.remove(&id))
        .map(|entry| {
            if entry.reasons.len() == 1 {
                ScoredCandidate {
                    source_weight: entry.total_weight,
                    ..entry.first
                }
            } else {
                ScoredCandidate {
                    item_id: entry.item_id,
                    score: (entry.weighted_sum / entry.total_weight).clamp(0.0, 5.0),
                    reason: Reason::HybridMultiple,
                    confidence: Confidence::fuse(entry.confidences),
                    source_weight: entry.total_weight,
                }
            }
        })
        .collect();

    blended.sort_by(|a, b| b.score.total_cmp(&a.score));
    blended.truncate(count);
    blended
}

/// Cold-start passthrough: the popularity list becomes the final list
/// untouched, tagged as the sole contributing source.
pub fn popularity_passthrough(items: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    items
        .into_iter()
        .map(|candidate| ScoredCandidate {
            source_weight: 1.0,
            ..candidate
        })
        .collect()
}
