//! Report generation for evaluation runs.

use std::collections::HashSet;

use blake3;
use serde::Serialize;

use crate::accuracy::{BucketTotals, DeltaBuckets, InaccuratePrediction};
use crate::aggregation::{AggregationMethod, RankingEntry};
use crate::contradiction::ConsistencySummary;
use crate::judgment::{DecisionTally, EvaluationInput, Judgment};
use crate::perturbation::{PerturbationConfig, PerturbationStats};
use crate::trials::{DeltaTrialSummary, Evaluation};

#[derive(Debug, Clone, Serialize)]
pub struct ReportOptions {
    /// Ranking rows to keep; `None` keeps all.
    pub top_n: Option<usize>,
    pub include_synthetic: bool,
    pub max_inaccurate: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: None,
            include_synthetic: false,
            max_inaccurate: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub input_hash: String,
    pub summary: ReportSummary,
    pub ranking: Vec<ReportRankingRow>,
    pub delta_table: Vec<ReportDeltaRow>,
    pub inaccurate_predictions: Vec<InaccuratePrediction>,
    pub run_stamp: ReportStamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub method: AggregationMethod,
    pub items: usize,
    pub judgments: usize,
    pub contradictions_removed: usize,
    pub ranking_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
    pub baseline_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_vs_baseline: Option<f64>,
    pub bucket_overall: BucketTotals,
    pub pre_aggregation_overall: BucketTotals,
    pub backward_weight: u64,
    pub consistency: ConsistencySummary,
    pub consistent_accurate: usize,
    pub accurate_rate: f64,
    pub inaccurate_rate: f64,
    pub decisions: DecisionTally,
    pub perturbation: PerturbationConfig,
    pub perturbation_stats: PerturbationStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRankingRow {
    #[serde(flatten)]
    pub entry: RankingEntry,
    pub synthetic: bool,
}

/// Post- and pre-aggregation accuracy for one delta.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDeltaRow {
    pub delta: f64,
    pub post_total: f64,
    pub post_correct: f64,
    pub post_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_trial_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_trial_se: Option<f64>,
    pub pre_total: f64,
    pub pre_correct: f64,
    pub pre_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_trial_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_trial_se: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStamp {
    pub rng_seed: Option<u64>,
    pub method: AggregationMethod,
    pub trials: usize,
    pub fas_max_iterations: usize,
}

pub fn build_report(
    input: &EvaluationInput,
    evaluation: &Evaluation,
    opts: &ReportOptions,
) -> EvaluationReport {
    let rep = &evaluation.representative;
    let synthetic = synthetic_items(&rep.judgments);

    let mut ranking = Vec::new();
    for entry in &rep.ranking.entries {
        let is_synthetic = synthetic.contains(entry.item.as_str());
        if is_synthetic && !opts.include_synthetic {
            continue;
        }
        if opts.top_n.is_some_and(|n| ranking.len() >= n) {
            break;
        }
        ranking.push(ReportRankingRow {
            entry: entry.clone(),
            synthetic: is_synthetic,
        });
    }

    let (post_summary, pre_summary) = match &evaluation.statistics {
        Some(stats) => (
            Some(stats.delta_summary.as_slice()),
            Some(stats.pre_aggregation_delta_summary.as_slice()),
        ),
        None => (None, None),
    };
    let delta_table = delta_rows(
        &rep.delta_accuracy,
        &rep.pre_aggregation_accuracy,
        post_summary,
        pre_summary,
    );

    let quality = &evaluation.prediction_quality;
    let summary = ReportSummary {
        method: rep.ranking.method,
        items: rep.ranking.entries.len(),
        judgments: rep.judgments.len(),
        contradictions_removed: rep.contradictions_removed,
        ranking_accuracy: evaluation.headline.ranking_accuracy,
        standard_error: evaluation.statistics.as_ref().map(|s| s.standard_error),
        baseline_accuracy: evaluation.baseline_accuracy,
        delta_vs_baseline: evaluation.delta_vs_baseline,
        bucket_overall: evaluation.headline.bucket_overall,
        pre_aggregation_overall: evaluation.headline.pre_aggregation_overall,
        backward_weight: rep.ranking.backward_weight,
        consistency: evaluation.consistency,
        consistent_accurate: quality.consistent_accurate,
        accurate_rate: quality.accurate_rate,
        inaccurate_rate: quality.inaccurate_rate,
        decisions: evaluation.decisions,
        perturbation: evaluation.config.perturbation.clone(),
        perturbation_stats: rep.perturbation,
    };

    EvaluationReport {
        input_hash: hash_input(input),
        summary,
        ranking,
        delta_table,
        inaccurate_predictions: quality
            .inaccurate
            .iter()
            .take(opts.max_inaccurate)
            .cloned()
            .collect(),
        run_stamp: ReportStamp {
            rng_seed: evaluation.config.seed,
            method: evaluation.config.method,
            trials: evaluation.statistics.as_ref().map_or(1, |s| s.trial_count),
            fas_max_iterations: evaluation.config.fas.max_iterations,
        },
    }
}

/// Items named only by synthetic judgments.
fn synthetic_items(judgments: &[Judgment]) -> HashSet<&str> {
    let mut real: HashSet<&str> = HashSet::new();
    let mut injected: HashSet<&str> = HashSet::new();
    for j in judgments {
        let target = if j.is_synthetic() {
            &mut injected
        } else {
            &mut real
        };
        target.insert(j.item_a.as_str());
        target.insert(j.item_b.as_str());
    }
    injected.retain(|id| !real.contains(id));
    injected
}

fn delta_rows(
    post: &DeltaBuckets,
    pre: &DeltaBuckets,
    post_summary: Option<&[DeltaTrialSummary]>,
    pre_summary: Option<&[DeltaTrialSummary]>,
) -> Vec<ReportDeltaRow> {
    let mut deltas: Vec<f64> = post.deltas().chain(pre.deltas()).collect();
    deltas.sort_by(f64::total_cmp);
    deltas.dedup();

    fn lookup(summary: Option<&[DeltaTrialSummary]>, delta: f64) -> Option<&DeltaTrialSummary> {
        summary.and_then(|rows| rows.iter().find(|r| r.delta == delta))
    }

    deltas
        .into_iter()
        .map(|delta| {
            let post_bucket = post.get(delta);
            let pre_bucket = pre.get(delta);
            let post_trial = lookup(post_summary, delta);
            let pre_trial = lookup(pre_summary, delta);
            ReportDeltaRow {
                delta,
                post_total: post_bucket.map_or(0.0, |b| b.total),
                post_correct: post_bucket.map_or(0.0, |b| b.correct),
                post_accuracy: post.accuracy_at(delta),
                post_trial_mean: post_trial.map(|t| t.mean_accuracy),
                post_trial_se: post_trial.map(|t| t.standard_error),
                pre_total: pre_bucket.map_or(0.0, |b| b.total),
                pre_correct: pre_bucket.map_or(0.0, |b| b.correct),
                pre_accuracy: pre.accuracy_at(delta),
                pre_trial_mean: pre_trial.map(|t| t.mean_accuracy),
                pre_trial_se: pre_trial.map(|t| t.standard_error),
            }
        })
        .collect()
}

pub fn render_report_markdown(report: &EvaluationReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str("# Evaluation Report\n\n");
    out.push_str(&format!("- Input hash: `{}`\n", report.input_hash));
    out.push_str(&format!("- Method: {}\n", s.method.as_str()));
    out.push_str(&format!(
        "- Items/judgments: {}/{}\n",
        s.items, s.judgments
    ));
    match s.standard_error {
        Some(se) => out.push_str(&format!(
            "- Ranking accuracy: {:.1}% ± {:.1}% over {} trials\n",
            s.ranking_accuracy, se, report.run_stamp.trials
        )),
        None => out.push_str(&format!("- Ranking accuracy: {:.1}%\n", s.ranking_accuracy)),
    }
    out.push_str(&format!("- Baseline accuracy: {:.1}%\n", s.baseline_accuracy));
    if let Some(dev) = s.delta_vs_baseline {
        out.push_str(&format!("- Deviation from baseline: {:+.1}%\n", dev));
    }
    out.push_str(&format!(
        "- Pre-aggregation accuracy: {:.1}% ({:.1}/{:.0})\n",
        s.pre_aggregation_overall.accuracy,
        s.pre_aggregation_overall.correct,
        s.pre_aggregation_overall.total
    ));
    out.push_str(&format!(
        "- Consistency: {:.1}% of {} bidirectional pairs\n",
        s.consistency.consistency_rate, s.consistency.bidirectional_pairs
    ));
    out.push_str(&format!(
        "- Decisions A/B/tie: {}/{}/{}\n",
        s.decisions.a_wins, s.decisions.b_wins, s.decisions.ties
    ));
    out.push_str(&format!("- Backward weight: {}\n", s.backward_weight));
    if let Some(seed) = report.run_stamp.rng_seed {
        out.push_str(&format!("- RNG seed: {}\n", seed));
    }

    out.push_str("\n## Ranking\n\n");
    out.push_str("| rank | item | score | wins | losses | ties | ground truth |\n");
    out.push_str("|---:|---|---:|---:|---:|---:|---:|\n");
    for row in &report.ranking {
        let e = &row.entry;
        let truth = e
            .ground_truth
            .map(|g| format!("{g}"))
            .unwrap_or_else(|| "-".to_string());
        let marker = if row.synthetic { " (synthetic)" } else { "" };
        out.push_str(&format!(
            "| {} | {}{} | {} | {} | {} | {} | {} |\n",
            e.rank, e.item, marker, e.score, e.wins, e.losses, e.ties, truth
        ));
    }

    if !report.delta_table.is_empty() {
        out.push_str("\n## Accuracy by delta\n\n");
        out.push_str("| delta | post | pre | pairs |\n");
        out.push_str("|---:|---:|---:|---:|\n");
        for row in &report.delta_table {
            let post = match (row.post_trial_mean, row.post_trial_se) {
                (Some(m), Some(se)) => format!("{m:.1}% ± {se:.1}%"),
                _ => format!("{:.1}%", row.post_accuracy),
            };
            out.push_str(&format!(
                "| {} | {} | {:.1}% | {:.0} |\n",
                row.delta, post, row.pre_accuracy, row.post_total
            ));
        }
    }

    if !report.inaccurate_predictions.is_empty() {
        out.push_str("\n## Consistent but wrong\n\n");
        for p in &report.inaccurate_predictions {
            out.push_str(&format!(
                "- {} vs {}: judge picked {}, truth {} (Δ {})\n",
                p.item_a,
                p.item_b,
                p.predicted_winner,
                p.ground_truth_winner,
                p.delta()
            ));
        }
    }

    out
}

fn hash_input(input: &EvaluationInput) -> String {
    let bytes = serde_json::to_vec(input).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::Decision;

    #[test]
    fn synthetic_items_excludes_real_participants() {
        let judgments = vec![
            Judgment::new("x", "y", Decision::A),
            Judgment::new("problem_1", "x", Decision::A).synthetic(),
        ];
        let items = synthetic_items(&judgments);
        assert_eq!(items.len(), 1);
        assert!(items.contains("problem_1"));
    }

    #[test]
    fn delta_rows_merge_both_bucket_sets() {
        let mut post = DeltaBuckets::new();
        post.record(1.0, 1.0, 0.0);
        let mut pre = DeltaBuckets::new();
        pre.record(1.0, 0.5, 0.5);
        pre.record(2.0, 0.0, 1.0);
        let rows = delta_rows(&post, &pre, None, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].post_accuracy, 100.0);
        assert_eq!(rows[0].pre_accuracy, 50.0);
        assert_eq!(rows[1].post_total, 0.0);
        assert_eq!(rows[1].pre_total, 1.0);
        assert!(rows[1].post_trial_mean.is_none());
    }

    #[test]
    fn delta_rows_carry_trial_summaries() {
        let mut post = DeltaBuckets::new();
        post.record(1.0, 1.0, 0.0);
        post.record(3.0, 0.0, 1.0);
        let pre = DeltaBuckets::new();
        let post_summary = [DeltaTrialSummary {
            delta: 1.0,
            total: 1.0,
            correct: 0.75,
            incorrect: 0.25,
            mean_accuracy: 75.0,
            standard_error: 12.5,
        }];
        let rows = delta_rows(&post, &pre, Some(&post_summary), Some(&[]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].post_trial_mean, Some(75.0));
        assert_eq!(rows[0].post_trial_se, Some(12.5));
        assert!(rows[0].pre_trial_mean.is_none());
        assert!(rows[1].post_trial_mean.is_none());
    }

    #[test]
    fn input_hash_is_stable() {
        let input = EvaluationInput {
            judgments: vec![Judgment::new("x", "y", Decision::A)],
            ..Default::default()
        };
        assert_eq!(hash_input(&input), hash_input(&input.clone()));
        assert_eq!(hash_input(&input).len(), 64);
    }
}
