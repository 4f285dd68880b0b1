//! Weighted multi-engine detection fusion.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::{Detection, FusedDetection, SpatialMatcher};
use crate::models::config::{EngineWeights, FusionConfig};

/// Transient cluster of detections denoting the same on-page span.
///
/// The seed is the highest-score detection that opened the region; every
/// member overlaps the seed's bounding box.
struct FusionRegion {
    seed: usize,
    members: Vec<(usize, f32)>,
}

/// Merges per-engine detection lists into one ranked fused list.
pub struct DetectionFuser {
    matcher: SpatialMatcher,
    weights: EngineWeights,
    consensus_bonus: f32,
    acceptance_threshold: f32,
    fallback_weight: f32,
}

impl DetectionFuser {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            matcher: SpatialMatcher::new(config.iou_threshold),
            weights: config.engine_weights.clone(),
            consensus_bonus: config.consensus_bonus,
            acceptance_threshold: config.acceptance_threshold,
            fallback_weight: config.fallback_weight,
        }
    }

    /// Fuse one page's detections across engines.
    ///
    /// Detections are scored `confidence * engine_weight`, grouped into
    /// spatially-overlapping regions in score order, and each region is
    /// resolved by text voting. The output is sorted in reading order
    /// (`y_min`, then `x_min`). Empty input yields empty output.
    pub fn fuse(&self, detections: &[Detection]) -> Vec<FusedDetection> {
        if detections.is_empty() {
            return Vec::new();
        }

        // Score, warning once per unknown engine rather than dropping it.
        let mut unknown: BTreeSet<&str> = BTreeSet::new();
        let mut scored: Vec<(usize, f32)> = detections
            .iter()
            .enumerate()
            .map(|(idx, d)| {
                let weight = match self.weights.get(&d.engine) {
                    Some(w) => w,
                    None => {
                        if unknown.insert(&d.engine) {
                            warn!(
                                engine = %d.engine,
                                fallback = self.fallback_weight,
                                "unknown engine, using fallback weight"
                            );
                        }
                        self.fallback_weight
                    }
                };
                (idx, d.confidence * weight)
            })
            .collect();

        // Stable sort keeps arrival order on equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        // Greedy region assignment against the seed's bounding box;
        // each detection joins at most one region.
        let mut regions: Vec<FusionRegion> = Vec::new();
        for (idx, score) in scored {
            let bbox = &detections[idx].bbox;
            match regions
                .iter_mut()
                .find(|r| self.matcher.overlaps(&detections[r.seed].bbox, bbox))
            {
                Some(region) => region.members.push((idx, score)),
                None => regions.push(FusionRegion {
                    seed: idx,
                    members: vec![(idx, score)],
                }),
            }
        }

        debug!(
            detections = detections.len(),
            regions = regions.len(),
            "grouped detections into fusion regions"
        );

        let mut fused: Vec<FusedDetection> = regions
            .iter()
            .map(|region| self.resolve(detections, region))
            .collect();

        fused.sort_by(|a, b| {
            (a.bbox.y_min, a.bbox.x_min)
                .partial_cmp(&(b.bbox.y_min, b.bbox.x_min))
                .unwrap_or(Ordering::Equal)
        });

        fused
    }

    /// Mean of fused confidences at or above the acceptance threshold.
    pub fn average_confidence(&self, fused: &[FusedDetection]) -> f32 {
        let accepted: Vec<f32> = fused
            .iter()
            .map(|f| f.confidence)
            .filter(|c| *c >= self.acceptance_threshold)
            .collect();

        if accepted.is_empty() {
            return 0.0;
        }
        accepted.iter().sum::<f32>() / accepted.len() as f32
    }

    fn resolve(&self, detections: &[Detection], region: &FusionRegion) -> FusedDetection {
        let seed = &detections[region.seed];

        // A lone detection passes through with its confidence untouched,
        // so single-engine fusion degenerates to identity.
        if region.members.len() == 1 {
            return FusedDetection {
                text: seed.text.clone(),
                bbox: seed.bbox,
                confidence: seed.confidence,
                engines_agreed: 1,
            };
        }

        // Sub-group members by normalized text; BTreeMap keeps the
        // tie-break independent of hash iteration order.
        let mut groups: BTreeMap<String, Vec<(usize, f32)>> = BTreeMap::new();
        for (idx, score) in &region.members {
            let key = normalize_text_key(&detections[*idx].text);
            groups.entry(key).or_default().push((*idx, *score));
        }

        // Winner: highest summed score; ties prefer the sub-group with
        // the highest-weighted single engine, then the lexicographically
        // smaller normalized text.
        let mut winner: Option<(&str, f32, f32)> = None;
        for (key, members) in &groups {
            let total: f32 = members.iter().map(|(_, s)| s).sum();
            let top_weight = members
                .iter()
                .map(|(idx, _)| {
                    self.weights
                        .get(&detections[*idx].engine)
                        .unwrap_or(self.fallback_weight)
                })
                .fold(0.0_f32, f32::max);

            let better = match winner {
                None => true,
                Some((_, best_total, best_weight)) => {
                    if total != best_total {
                        total > best_total
                    } else {
                        top_weight > best_weight
                    }
                }
            };
            if better {
                winner = Some((key.as_str(), total, top_weight));
            }
        }

        let (winner_key, summed_score, _) = winner.expect("region has at least one member");
        let members = &groups[winner_key];

        let engines: BTreeSet<&str> = members
            .iter()
            .map(|(idx, _)| detections[*idx].engine.as_str())
            .collect();

        let mut confidence = summed_score;
        if engines.len() > 1 {
            confidence += self.consensus_bonus;
        }
        let confidence = confidence.min(1.0);

        // Emit the raw text of the most confident member of the winning
        // sub-group; the normalized key is only a grouping device.
        let text = members
            .iter()
            .max_by(|a, b| {
                detections[a.0]
                    .confidence
                    .partial_cmp(&detections[b.0].confidence)
                    .unwrap_or(Ordering::Equal)
            })
            .map(|(idx, _)| detections[*idx].text.clone())
            .unwrap_or_else(|| seed.text.clone());

        FusedDetection {
            text,
            bbox: seed.bbox,
            confidence,
            engines_agreed: engines.len(),
        }
    }
}

/// Grouping key: case-insensitive, whitespace-collapsed text.
fn normalize_text_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
