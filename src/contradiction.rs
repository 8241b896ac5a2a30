//! Order-reversal contradiction detection.
//!
//! A pair judged in both orientations is a contradiction when each
//! orientation named a winner and the two winners differ. Ties never
//! contradict anything.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::judgment::{unique_pairs, Judgment, PairKey};

#[derive(Debug, Clone, Serialize)]
pub struct Contradiction {
    pub key: PairKey,
    pub forward: Judgment,
    pub backward: Judgment,
    pub forward_winner: String,
    pub backward_winner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContradictionReport {
    pub contradictions: Vec<Contradiction>,
    /// Unique pairs judged in both orientations.
    pub bidirectional_pairs: usize,
    pub unique_pairs: usize,
}

impl ContradictionReport {
    pub fn consistency(&self) -> ConsistencySummary {
        ConsistencySummary::new(self.bidirectional_pairs, self.contradictions.len())
    }
}

/// Rates over bidirectional pairs. With no bidirectional pairs the run is
/// reported as fully consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsistencySummary {
    pub bidirectional_pairs: usize,
    pub consistent_pairs: usize,
    pub inconsistent_pairs: usize,
    pub consistency_rate: f64,
    pub inconsistency_rate: f64,
}

impl ConsistencySummary {
    pub fn new(bidirectional_pairs: usize, inconsistent_pairs: usize) -> Self {
        let consistent_pairs = bidirectional_pairs.saturating_sub(inconsistent_pairs);
        let (consistency_rate, inconsistency_rate) = if bidirectional_pairs > 0 {
            let total = bidirectional_pairs as f64;
            (
                consistent_pairs as f64 / total * 100.0,
                inconsistent_pairs as f64 / total * 100.0,
            )
        } else {
            (100.0, 0.0)
        };
        Self {
            bidirectional_pairs,
            consistent_pairs,
            inconsistent_pairs,
            consistency_rate,
            inconsistency_rate,
        }
    }
}

/// Scans unique pairs for order-reversal contradictions. Never mutates input.
///
/// Each unordered pair is reported at most once, keyed canonically.
pub fn find_contradictions(judgments: &[Judgment]) -> ContradictionReport {
    let pairs = unique_pairs(judgments);
    let mut contradictions = Vec::new();
    let mut bidirectional_pairs = 0usize;

    for pair in &pairs {
        let Some(reverse) = pair.reverse else {
            continue;
        };
        bidirectional_pairs += 1;
        if let (Some(fw), Some(bw)) = (pair.forward_winner(), pair.reverse_winner()) {
            if fw != bw {
                contradictions.push(Contradiction {
                    key: pair.key.clone(),
                    forward: pair.forward.clone(),
                    backward: reverse.clone(),
                    forward_winner: fw.to_string(),
                    backward_winner: bw.to_string(),
                });
            }
        }
    }

    ContradictionReport {
        contradictions,
        bidirectional_pairs,
        unique_pairs: pairs.len(),
    }
}

/// Drops both orientations of every contradictory pair.
///
/// Every judgment on a contradictory pair is removed, including duplicates.
pub fn remove_contradictions(judgments: &[Judgment]) -> Vec<Judgment> {
    let contradictory: HashSet<PairKey> = unique_pairs(judgments)
        .into_iter()
        .filter(|p| p.is_contradiction())
        .map(|p| p.key)
        .collect();

    if contradictory.is_empty() {
        return judgments.to_vec();
    }

    let kept: Vec<Judgment> = judgments
        .iter()
        .filter(|j| !contradictory.contains(&j.pair_key()))
        .cloned()
        .collect();

    debug!(
        removed = judgments.len() - kept.len(),
        pairs = contradictory.len(),
        "removed contradictory judgments"
    );
    kept
}
