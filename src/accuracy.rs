//! Accuracy of rankings and raw judgments against ground truth.
//!
//! Three measurements:
//! - pairwise ranking accuracy over every pair with distinct known scores;
//! - delta-bucketed accuracy from the ranking, where bucket membership
//!   depends only on ground truth (so it is stable under perturbation);
//! - pre-aggregation accuracy by delta, scored on raw unique-pair judgments
//!   with split credit for ties.
//!
//! Equal-score pairs are resolved by the sub-criteria tie-break; pairs with no
//! resolvable ground-truth winner are skipped everywhere, never counted wrong.
//! All accuracies are percentages in `[0, 100]`; an empty denominator gives 0.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::aggregation::RankingEntry;
use crate::judgment::{unique_pairs, Decision, Feedback, GroundTruth, Judgment};

/// Deltas are rounded to this many decimal places before bucketing, so that
/// fractional scores do not scatter across float-noise buckets.
const DELTA_DECIMALS: i32 = 6;

fn bucket_delta(a: f64, b: f64) -> f64 {
    let scale = 10f64.powi(DELTA_DECIMALS);
    ((a - b).abs() * scale).round() / scale
}

fn percent(correct: f64, total: f64) -> f64 {
    if total > 0.0 {
        correct / total * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// Ground-truth winner
// =============================================================================

/// Ground-truth winner of `(a, b)` as a decision in that perspective.
///
/// Higher score wins. Equal scores fall back to the count of satisfied
/// sub-criteria; `None` when either score is unknown, feedback is missing for
/// either item, or the counts are equal too.
pub fn ground_truth_winner(
    a: &str,
    b: &str,
    ground_truth: &GroundTruth,
    feedback: &Feedback,
) -> Option<Decision> {
    let score_a = ground_truth.score(a)?;
    let score_b = ground_truth.score(b)?;
    match score_a.partial_cmp(&score_b)? {
        Ordering::Greater => Some(Decision::A),
        Ordering::Less => Some(Decision::B),
        Ordering::Equal => {
            let count_a = feedback.satisfied_count(a)?;
            let count_b = feedback.satisfied_count(b)?;
            match count_a.cmp(&count_b) {
                Ordering::Greater => Some(Decision::A),
                Ordering::Less => Some(Decision::B),
                Ordering::Equal => None,
            }
        }
    }
}

fn predicted_from_ranks(rank_a: usize, rank_b: usize) -> Decision {
    match rank_a.cmp(&rank_b) {
        Ordering::Less => Decision::A,
        Ordering::Greater => Decision::B,
        Ordering::Equal => Decision::Tie,
    }
}

// =============================================================================
// Pairwise ranking accuracy
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAccuracy {
    pub accuracy: f64,
    pub total_pairs: usize,
    pub correct_pairs: usize,
    pub incorrect_pairs: usize,
}

impl PairwiseAccuracy {
    pub fn from_counts(correct_pairs: usize, total_pairs: usize) -> Self {
        Self {
            accuracy: percent(correct_pairs as f64, total_pairs as f64),
            total_pairs,
            correct_pairs,
            incorrect_pairs: total_pairs - correct_pairs,
        }
    }
}

/// Fraction of distinct-score pairs the ranking orders correctly.
///
/// Equal ranks predict a tie, which is wrong against any non-tied truth.
/// Equal-score pairs are excluded here (no sub-criteria tie-break).
pub fn ranking_accuracy(entries: &[RankingEntry], ground_truth: &GroundTruth) -> PairwiseAccuracy {
    let mut total = 0usize;
    let mut correct = 0usize;
    for (i, first) in entries.iter().enumerate() {
        let Some(score_a) = ground_truth.score(&first.item) else {
            continue;
        };
        for second in &entries[i + 1..] {
            let Some(score_b) = ground_truth.score(&second.item) else {
                continue;
            };
            if score_a == score_b {
                continue;
            }
            let truth = if score_a > score_b {
                Decision::A
            } else {
                Decision::B
            };
            total += 1;
            if predicted_from_ranks(first.rank, second.rank) == truth {
                correct += 1;
            }
        }
    }
    PairwiseAccuracy::from_counts(correct, total)
}

// =============================================================================
// Delta buckets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaBucket {
    /// Absolute ground-truth score difference.
    pub delta: f64,
    pub total: f64,
    pub correct: f64,
    pub incorrect: f64,
}

impl DeltaBucket {
    fn empty(delta: f64) -> Self {
        Self {
            delta,
            total: 0.0,
            correct: 0.0,
            incorrect: 0.0,
        }
    }

    pub fn accuracy(&self) -> f64 {
        percent(self.correct, self.total)
    }
}

/// Buckets keyed by delta, kept sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeltaBuckets {
    buckets: Vec<DeltaBucket>,
}

impl DeltaBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, delta: f64) -> &mut DeltaBucket {
        let pos = match self
            .buckets
            .binary_search_by(|b| b.delta.total_cmp(&delta))
        {
            Ok(pos) => pos,
            Err(pos) => {
                self.buckets.insert(pos, DeltaBucket::empty(delta));
                pos
            }
        };
        &mut self.buckets[pos]
    }

    /// Records one scored pair with the given credit split.
    pub fn record(&mut self, delta: f64, correct: f64, incorrect: f64) {
        let bucket = self.entry(delta);
        bucket.total += 1.0;
        bucket.correct += correct;
        bucket.incorrect += incorrect;
    }

    pub fn get(&self, delta: f64) -> Option<&DeltaBucket> {
        self.buckets
            .binary_search_by(|b| b.delta.total_cmp(&delta))
            .ok()
            .map(|pos| &self.buckets[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeltaBucket> {
        self.buckets.iter()
    }

    pub fn deltas(&self) -> impl Iterator<Item = f64> + '_ {
        self.buckets.iter().map(|b| b.delta)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Accuracy of bucket `delta`, 0 when absent or empty.
    pub fn accuracy_at(&self, delta: f64) -> f64 {
        self.get(delta).map(DeltaBucket::accuracy).unwrap_or(0.0)
    }

    /// Pooled totals over buckets with `delta > 0`.
    pub fn overall_nonzero(&self) -> BucketTotals {
        BucketTotals::pool(self.buckets.iter().filter(|b| b.delta > 0.0))
    }

    /// Pooled totals over every bucket.
    pub fn overall(&self) -> BucketTotals {
        BucketTotals::pool(self.buckets.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketTotals {
    pub accuracy: f64,
    pub total: f64,
    pub correct: f64,
    pub incorrect: f64,
}

impl BucketTotals {
    fn pool<'a>(buckets: impl Iterator<Item = &'a DeltaBucket>) -> Self {
        let mut totals = Self::default();
        for b in buckets {
            totals.total += b.total;
            totals.correct += b.correct;
            totals.incorrect += b.incorrect;
        }
        totals.accuracy = percent(totals.correct, totals.total);
        totals
    }
}

/// Delta-bucketed accuracy of the ranking's implied pairwise order.
///
/// Pairs are enumerated from the ranking rows, so bucket totals depend only on
/// which items appear and their ground truth.
pub fn accuracy_by_delta_from_rankings(
    entries: &[RankingEntry],
    ground_truth: &GroundTruth,
    feedback: &Feedback,
) -> DeltaBuckets {
    let mut buckets = DeltaBuckets::new();
    for (i, first) in entries.iter().enumerate() {
        let Some(score_a) = ground_truth.score(&first.item) else {
            continue;
        };
        for second in &entries[i + 1..] {
            let Some(score_b) = ground_truth.score(&second.item) else {
                continue;
            };
            let Some(truth) = ground_truth_winner(&first.item, &second.item, ground_truth, feedback)
            else {
                continue;
            };
            let hit = predicted_from_ranks(first.rank, second.rank) == truth;
            let (correct, incorrect) = if hit { (1.0, 0.0) } else { (0.0, 1.0) };
            buckets.record(bucket_delta(score_a, score_b), correct, incorrect);
        }
    }
    buckets
}

/// Delta-bucketed accuracy of raw judgments, one vote per unique pair.
///
/// The first-seen (forward) judgment of each pair casts the vote; a reverse
/// judgment never overrides it. A tie earns half credit each way.
pub fn pre_aggregation_accuracy_by_delta(
    judgments: &[Judgment],
    ground_truth: &GroundTruth,
    feedback: &Feedback,
) -> DeltaBuckets {
    let mut buckets = DeltaBuckets::new();
    for pair in unique_pairs(judgments) {
        let a = pair.forward.item_a.as_str();
        let b = pair.forward.item_b.as_str();
        let (Some(score_a), Some(score_b)) = (ground_truth.score(a), ground_truth.score(b)) else {
            continue;
        };
        let Some(truth) = ground_truth_winner(a, b, ground_truth, feedback) else {
            continue;
        };
        let (correct, incorrect) = match pair.forward.decision {
            Decision::Tie => (0.5, 0.5),
            d if d == truth => (1.0, 0.0),
            _ => (0.0, 1.0),
        };
        buckets.record(bucket_delta(score_a, score_b), correct, incorrect);
    }
    buckets
}

/// Pooled pre-aggregation accuracy over every bucket, zero-delta included.
pub fn pre_aggregation_accuracy(
    judgments: &[Judgment],
    ground_truth: &GroundTruth,
    feedback: &Feedback,
) -> BucketTotals {
    pre_aggregation_accuracy_by_delta(judgments, ground_truth, feedback).overall()
}

// =============================================================================
// Consistent-but-wrong predictions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InaccuratePrediction {
    pub item_a: String,
    pub item_b: String,
    pub score_a: f64,
    pub score_b: f64,
    pub predicted_winner: String,
    pub ground_truth_winner: String,
}

impl InaccuratePrediction {
    pub fn delta(&self) -> f64 {
        (self.score_a - self.score_b).abs()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionQuality {
    pub inaccurate: Vec<InaccuratePrediction>,
    /// Bidirectional pairs that were neither contradictory nor wrong.
    pub consistent_accurate: usize,
    /// `consistent_accurate` over bidirectional pairs, 100 when there are none.
    pub accurate_rate: f64,
    pub inaccurate_rate: f64,
}

/// Pairs judged in both orientations with the same winner, where that winner
/// disagrees with distinct known ground-truth scores.
///
/// Sorted by delta descending, then `item_a`, then `item_b`.
pub fn find_inaccurate_predictions(
    judgments: &[Judgment],
    ground_truth: &GroundTruth,
) -> Vec<InaccuratePrediction> {
    let mut inaccurate = Vec::new();
    for pair in unique_pairs(judgments) {
        if !pair.is_bidirectional() {
            continue;
        }
        let a = pair.forward.item_a.as_str();
        let b = pair.forward.item_b.as_str();
        let (Some(score_a), Some(score_b)) = (ground_truth.score(a), ground_truth.score(b)) else {
            continue;
        };
        if score_a == score_b {
            continue;
        }
        let truth = if score_a > score_b { a } else { b };
        if let (Some(fw), Some(bw)) = (pair.forward_winner(), pair.reverse_winner()) {
            if fw == bw && fw != truth {
                inaccurate.push(InaccuratePrediction {
                    item_a: a.to_string(),
                    item_b: b.to_string(),
                    score_a,
                    score_b,
                    predicted_winner: fw.to_string(),
                    ground_truth_winner: truth.to_string(),
                });
            }
        }
    }
    inaccurate.sort_by(|x, y| {
        y.delta()
            .total_cmp(&x.delta())
            .then_with(|| x.item_a.cmp(&y.item_a))
            .then_with(|| x.item_b.cmp(&y.item_b))
    });
    inaccurate
}

pub fn prediction_quality(
    judgments: &[Judgment],
    ground_truth: &GroundTruth,
    bidirectional_pairs: usize,
    contradictions: usize,
) -> PredictionQuality {
    let inaccurate = find_inaccurate_predictions(judgments, ground_truth);
    let consistent_accurate = bidirectional_pairs
        .saturating_sub(contradictions)
        .saturating_sub(inaccurate.len());
    let (accurate_rate, inaccurate_rate) = if bidirectional_pairs > 0 {
        let total = bidirectional_pairs as f64;
        (
            consistent_accurate as f64 / total * 100.0,
            inaccurate.len() as f64 / total * 100.0,
        )
    } else {
        (100.0, 0.0)
    };
    PredictionQuality {
        inaccurate,
        consistent_accurate,
        accurate_rate,
        inaccurate_rate,
    }
}
