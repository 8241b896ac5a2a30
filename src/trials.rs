//! Monte Carlo trial runner and the evaluation context.
//!
//! Every trial starts from the pristine judgment list: contradiction
//! removal, problem nodes, edge cutting, flipping, ranking, scoring. Trials
//! share nothing but the immutable inputs, and each draws from its own RNG
//! seeded off the run's master RNG, so a fixed seed reproduces the run.

use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::accuracy::{
    accuracy_by_delta_from_rankings, pre_aggregation_accuracy_by_delta, prediction_quality,
    ranking_accuracy, BucketTotals, DeltaBuckets, PairwiseAccuracy, PredictionQuality,
};
use crate::aggregation::{aggregate_with_items, AggregationMethod, FasConfig, Ranking};
use crate::contradiction::{
    find_contradictions, remove_contradictions, ConsistencySummary, ContradictionReport,
};
use crate::error::ConfigError;
use crate::graph::ItemIndex;
use crate::judgment::{DecisionTally, EvaluationInput, Feedback, GroundTruth, Judgment};
use crate::perturbation::{apply_perturbations, PerturbationConfig, PerturbationStats};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    #[serde(default)]
    pub method: AggregationMethod,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default)]
    pub perturbation: PerturbationConfig,
    /// Master seed. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub fas: FasConfig,
}

fn default_trials() -> usize {
    1
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            method: AggregationMethod::default(),
            trials: default_trials(),
            perturbation: PerturbationConfig::default(),
            seed: None,
            fas: FasConfig::default(),
        }
    }
}

impl TrialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials < 1 {
            return Err(ConfigError::InvalidTrialCount(self.trials));
        }
        self.perturbation.validate()
    }

    fn master_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

// =============================================================================
// Single trial
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TrialOutcome {
    pub ranking: Ranking,
    pub ranking_accuracy: PairwiseAccuracy,
    /// Post-aggregation accuracy by delta, from the ranking.
    pub delta_accuracy: DeltaBuckets,
    /// Raw judgment accuracy by delta, on this trial's judgment list.
    pub pre_aggregation_accuracy: DeltaBuckets,
    /// The judgment list the ranking was computed from.
    pub judgments: Vec<Judgment>,
    pub contradictions_removed: usize,
    pub perturbation: PerturbationStats,
}

/// Runs one full pipeline from `original`.
pub fn run_trial(
    original: &[Judgment],
    ground_truth: &GroundTruth,
    feedback: &Feedback,
    cfg: &TrialConfig,
    rng: &mut impl Rng,
) -> TrialOutcome {
    let removed = find_contradictions(original);
    let removed_by_item = contradiction_counts(&removed);
    let cleaned = remove_contradictions(original);
    let contradictions_removed = original.len() - cleaned.len();

    let (judgments, perturbation) = apply_perturbations(&cleaned, &cfg.perturbation, rng);

    // Pristine item set: cut or contradiction-only items keep their rows.
    let items = ItemIndex::from_judgments(original);
    let mut ranking = aggregate_with_items(items, &judgments, cfg.method, ground_truth, &cfg.fas);
    for entry in &mut ranking.entries {
        entry.contradictions += removed_by_item.get(entry.item.as_str()).copied().unwrap_or(0);
    }

    let ranking_accuracy = ranking_accuracy(&ranking.entries, ground_truth);
    if ranking_accuracy.total_pairs == 0 {
        warn!("no ranked pair has distinct known ground-truth scores");
    }
    let delta_accuracy = accuracy_by_delta_from_rankings(&ranking.entries, ground_truth, feedback);
    let pre_aggregation_accuracy =
        pre_aggregation_accuracy_by_delta(&judgments, ground_truth, feedback);

    TrialOutcome {
        ranking,
        ranking_accuracy,
        delta_accuracy,
        pre_aggregation_accuracy,
        judgments,
        contradictions_removed,
        perturbation,
    }
}

/// Contradictory pairs per item.
fn contradiction_counts(report: &ContradictionReport) -> HashMap<&str, u32> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for c in &report.contradictions {
        *counts.entry(c.key.low.as_str()).or_insert(0) += 1;
        *counts.entry(c.key.high.as_str()).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// Aggregation across trials
// =============================================================================

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation over `√n`; 0 for fewer than two values.
pub fn standard_error(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let n = values.len() as f64;
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    variance.sqrt() / n.sqrt()
}

/// Per-delta accuracy across trials. Counts come from the first trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaTrialSummary {
    pub delta: f64,
    pub total: f64,
    pub correct: f64,
    pub incorrect: f64,
    pub mean_accuracy: f64,
    pub standard_error: f64,
}

fn summarize_deltas(per_trial: &[DeltaBuckets]) -> Vec<DeltaTrialSummary> {
    let mut deltas: Vec<f64> = per_trial.iter().flat_map(|b| b.deltas()).collect();
    deltas.sort_by(f64::total_cmp);
    deltas.dedup();

    deltas
        .into_iter()
        .map(|delta| {
            let accuracies: Vec<f64> = per_trial.iter().map(|b| b.accuracy_at(delta)).collect();
            let first = per_trial.first().and_then(|b| b.get(delta));
            DeltaTrialSummary {
                delta,
                total: first.map_or(0.0, |b| b.total),
                correct: first.map_or(0.0, |b| b.correct),
                incorrect: first.map_or(0.0, |b| b.incorrect),
                mean_accuracy: mean(&accuracies),
                standard_error: standard_error(&accuracies),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialStatistics {
    pub trial_count: usize,
    pub mean_accuracy: f64,
    pub standard_error: f64,
    pub min_accuracy: f64,
    pub max_accuracy: f64,
    /// Pair counts of the first trial; not averaged.
    pub total_pairs: usize,
    pub correct_pairs: usize,
    pub incorrect_pairs: usize,
    pub trial_accuracies: Vec<f64>,
    pub delta_accuracies: Vec<DeltaBuckets>,
    pub pre_aggregation_delta_accuracies: Vec<DeltaBuckets>,
    pub delta_summary: Vec<DeltaTrialSummary>,
    pub pre_aggregation_delta_summary: Vec<DeltaTrialSummary>,
}

impl TrialStatistics {
    /// Aggregates trial outcomes. Order does not matter except for which
    /// trial supplies the representative counts (the first).
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let trial_accuracies: Vec<f64> = outcomes
            .iter()
            .map(|o| o.ranking_accuracy.accuracy)
            .collect();
        let delta_accuracies: Vec<DeltaBuckets> =
            outcomes.iter().map(|o| o.delta_accuracy.clone()).collect();
        let pre_aggregation_delta_accuracies: Vec<DeltaBuckets> = outcomes
            .iter()
            .map(|o| o.pre_aggregation_accuracy.clone())
            .collect();
        let first = outcomes
            .first()
            .map(|o| o.ranking_accuracy)
            .unwrap_or_default();

        Self {
            trial_count: outcomes.len(),
            mean_accuracy: mean(&trial_accuracies),
            standard_error: standard_error(&trial_accuracies),
            min_accuracy: trial_accuracies.iter().copied().fold(f64::INFINITY, f64::min),
            max_accuracy: trial_accuracies
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
            total_pairs: first.total_pairs,
            correct_pairs: first.correct_pairs,
            incorrect_pairs: first.incorrect_pairs,
            delta_summary: summarize_deltas(&delta_accuracies),
            pre_aggregation_delta_summary: summarize_deltas(&pre_aggregation_delta_accuracies),
            trial_accuracies,
            delta_accuracies,
            pre_aggregation_delta_accuracies,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialRun {
    /// First trial, kept whole for display.
    pub representative: TrialOutcome,
    pub statistics: TrialStatistics,
}

/// Runs `cfg.trials` independent trials from the pristine list.
///
/// Trial count is validated by [`TrialConfig::validate`] at the boundary;
/// a zero count still runs a single trial here.
pub fn run_trials(
    original: &[Judgment],
    ground_truth: &GroundTruth,
    feedback: &Feedback,
    cfg: &TrialConfig,
    rng: &mut impl Rng,
) -> TrialRun {
    let trials = cfg.trials.max(1);
    let mut outcomes = Vec::with_capacity(trials);
    for trial in 0..trials {
        let mut trial_rng = StdRng::seed_from_u64(rng.gen());
        let outcome = run_trial(original, ground_truth, feedback, cfg, &mut trial_rng);
        info!(
            trial = trial + 1,
            accuracy = outcome.ranking_accuracy.accuracy,
            correct = outcome.ranking_accuracy.correct_pairs,
            total = outcome.ranking_accuracy.total_pairs,
            judgments = outcome.judgments.len(),
            "trial finished"
        );
        outcomes.push(outcome);
    }

    let statistics = TrialStatistics::from_outcomes(&outcomes);
    info!(
        trials,
        mean = statistics.mean_accuracy,
        standard_error = statistics.standard_error,
        min = statistics.min_accuracy,
        max = statistics.max_accuracy,
        "trials summarized"
    );

    let representative = outcomes.swap_remove(0);
    TrialRun {
        representative,
        statistics,
    }
}

// =============================================================================
// Evaluation context
// =============================================================================

/// Headline numbers for one evaluation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeadlineAccuracy {
    /// Pairwise ranking accuracy over distinct-score pairs (trial mean when
    /// trials ran). This is the canonical "Δ > 0" figure.
    pub ranking_accuracy: f64,
    /// Pooled post-aggregation buckets with `Δ > 0`, representative trial.
    pub bucket_overall: BucketTotals,
    /// Pooled pre-aggregation buckets, representative trial.
    pub pre_aggregation_overall: BucketTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub config: TrialConfig,
    pub representative: TrialOutcome,
    /// Present for perturbed runs and whenever more than one trial ran.
    pub statistics: Option<TrialStatistics>,
    pub headline: HeadlineAccuracy,
    pub baseline_accuracy: f64,
    /// Headline minus baseline; `None` for the baseline run itself.
    pub delta_vs_baseline: Option<f64>,
    /// Contradictions in the original judgments.
    pub contradictions: ContradictionReport,
    pub consistency: ConsistencySummary,
    pub prediction_quality: PredictionQuality,
    pub decisions: DecisionTally,
}

/// Immutable inputs for a run plus the baseline accuracy, computed at most
/// once per aggregation method.
#[derive(Debug)]
pub struct EvaluationContext {
    judgments: Vec<Judgment>,
    ground_truth: GroundTruth,
    feedback: Feedback,
    baselines: [OnceCell<f64>; 2],
}

impl EvaluationContext {
    pub fn new(input: EvaluationInput) -> Self {
        Self {
            judgments: input.judgments,
            ground_truth: input.ground_truth,
            feedback: input.feedback,
            baselines: [OnceCell::new(), OnceCell::new()],
        }
    }

    pub fn judgments(&self) -> &[Judgment] {
        &self.judgments
    }

    pub fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn baseline_cell(&self, method: AggregationMethod) -> &OnceCell<f64> {
        match method {
            AggregationMethod::NetWins => &self.baselines[0],
            AggregationMethod::FeedbackArcSet => &self.baselines[1],
        }
    }

    /// Unperturbed ranking accuracy for `method`, cached after first use.
    pub fn baseline_accuracy(&self, method: AggregationMethod, fas: &FasConfig) -> f64 {
        *self.baseline_cell(method).get_or_init(|| {
            let cfg = TrialConfig {
                method,
                fas: fas.clone(),
                ..TrialConfig::default()
            };
            // Zero perturbation draws nothing that affects the result.
            let mut rng = StdRng::seed_from_u64(0);
            let outcome = run_trial(
                &self.judgments,
                &self.ground_truth,
                &self.feedback,
                &cfg,
                &mut rng,
            );
            debug!(
                method = method.as_str(),
                accuracy = outcome.ranking_accuracy.accuracy,
                "baseline cached"
            );
            outcome.ranking_accuracy.accuracy
        })
    }

    /// Validates `cfg`, then runs either a single unperturbed pass or the
    /// full trial set.
    pub fn evaluate(&self, cfg: &TrialConfig) -> Result<Evaluation, ConfigError> {
        cfg.validate()?;
        let mut rng = cfg.master_rng();

        let (representative, statistics) = if cfg.perturbation.is_baseline() && cfg.trials == 1 {
            let outcome = run_trial(
                &self.judgments,
                &self.ground_truth,
                &self.feedback,
                cfg,
                &mut rng,
            );
            (outcome, None)
        } else {
            let run = run_trials(
                &self.judgments,
                &self.ground_truth,
                &self.feedback,
                cfg,
                &mut rng,
            );
            (run.representative, Some(run.statistics))
        };

        let baseline_accuracy = if statistics.is_none() {
            *self
                .baseline_cell(cfg.method)
                .get_or_init(|| representative.ranking_accuracy.accuracy)
        } else {
            self.baseline_accuracy(cfg.method, &cfg.fas)
        };

        let ranking_accuracy = statistics
            .as_ref()
            .map(|s| s.mean_accuracy)
            .unwrap_or(representative.ranking_accuracy.accuracy);
        let headline = HeadlineAccuracy {
            ranking_accuracy,
            bucket_overall: representative.delta_accuracy.overall_nonzero(),
            pre_aggregation_overall: representative.pre_aggregation_accuracy.overall(),
        };
        let delta_vs_baseline = statistics
            .as_ref()
            .map(|s| s.mean_accuracy - baseline_accuracy);

        let contradictions = find_contradictions(&self.judgments);
        let consistency = contradictions.consistency();
        let prediction_quality = prediction_quality(
            &self.judgments,
            &self.ground_truth,
            contradictions.bidirectional_pairs,
            contradictions.contradictions.len(),
        );
        let decisions = DecisionTally::from_judgments(&representative.judgments);

        Ok(Evaluation {
            config: cfg.clone(),
            representative,
            statistics,
            headline,
            baseline_accuracy,
            delta_vs_baseline,
            contradictions,
            consistency,
            prediction_quality,
            decisions,
        })
    }
}
