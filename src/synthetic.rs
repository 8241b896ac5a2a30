//! Offline evaluation suite.
//!
//! Runs synthetic cases through the full trial pipeline, replacing the
//! pairwise judge with a seeded simulator whose error modes are known.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::aggregation::AggregationMethod;
use crate::error::ConfigError;
use crate::judgment::{Decision, EvaluationInput, Feedback, GroundTruth, ItemFeedback, Judgment};
use crate::perturbation::PerturbationConfig;
use crate::trials::{EvaluationContext, TrialConfig};

// =============================================================================
// Synthetic case definitions
// =============================================================================

#[derive(Debug, Clone)]
pub enum SimulatedJudge {
    /// Picks A with probability `logistic((score_a - score_b) / noise_scale)`,
    /// shifted by `position_bias` toward the first-presented item. A zero
    /// scale is a perfect judge.
    Logistic {
        noise_scale: f64,
        position_bias: f64,
        tie_rate: f64,
        /// Fraction of unordered pairs that get judged at all.
        coverage: f64,
    },
    /// Fixed judgments by item index.
    Scripted(Vec<(usize, usize, Decision)>),
}

#[derive(Debug, Clone)]
pub struct SyntheticCase {
    pub name: &'static str,
    pub scores: Vec<f64>,
    /// Sub-criteria flags per item; empty means no feedback.
    pub sub_criteria: Vec<Vec<bool>>,
    pub judge: SimulatedJudge,
    pub trial: TrialConfig,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurvePoint {
    pub delta: f64,
    pub post_accuracy: f64,
    pub pre_accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntheticMetrics {
    pub ranking_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
    pub baseline_accuracy: f64,
    pub bucket_overall: f64,
    pub pre_aggregation_accuracy: f64,
    pub consistency_rate: f64,
    pub contradictions: usize,
    pub inaccurate_predictions: usize,
    pub backward_weight: u64,
    pub judgments: usize,
    pub items: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntheticResult {
    pub case_name: String,
    pub method: AggregationMethod,
    pub metrics: SyntheticMetrics,
    pub ranking: Vec<String>,
    pub curve: Vec<CurvePoint>,
}

// =============================================================================
// Public API
// =============================================================================

pub fn synthetic_cases() -> Vec<SyntheticCase> {
    let perfect = SimulatedJudge::Logistic {
        noise_scale: 0.0,
        position_bias: 0.0,
        tie_rate: 0.0,
        coverage: 1.0,
    };

    vec![
        SyntheticCase {
            name: "clean_ordering_10",
            scores: descending(10),
            sub_criteria: vec![],
            judge: perfect.clone(),
            trial: TrialConfig::default(),
            seed: 42,
        },
        SyntheticCase {
            name: "noisy_judge_20",
            scores: descending(20),
            sub_criteria: vec![],
            judge: SimulatedJudge::Logistic {
                noise_scale: 2.0,
                position_bias: 0.0,
                tie_rate: 0.0,
                coverage: 1.0,
            },
            trial: TrialConfig::default(),
            seed: 43,
        },
        SyntheticCase {
            name: "position_biased_12",
            scores: descending(12),
            sub_criteria: vec![],
            judge: SimulatedJudge::Logistic {
                noise_scale: 1.5,
                position_bias: 0.3,
                tie_rate: 0.0,
                coverage: 1.0,
            },
            trial: TrialConfig {
                method: AggregationMethod::NetWins,
                ..TrialConfig::default()
            },
            seed: 44,
        },
        SyntheticCase {
            name: "tie_heavy_12",
            scores: (0..12).map(|i| (6 - i / 2) as f64).collect(),
            sub_criteria: (0..12).map(|i| vec![i % 2 == 0, i % 3 == 0]).collect(),
            judge: SimulatedJudge::Logistic {
                noise_scale: 1.0,
                position_bias: 0.0,
                tie_rate: 0.4,
                coverage: 1.0,
            },
            trial: TrialConfig::default(),
            seed: 45,
        },
        SyntheticCase {
            name: "sparse_coverage_30",
            scores: descending(30),
            sub_criteria: vec![],
            judge: SimulatedJudge::Logistic {
                noise_scale: 1.0,
                position_bias: 0.0,
                tie_rate: 0.0,
                coverage: 0.3,
            },
            trial: TrialConfig {
                trials: 5,
                perturbation: PerturbationConfig {
                    flip_pct: 10.0,
                    ..PerturbationConfig::default()
                },
                seed: Some(7),
                ..TrialConfig::default()
            },
            seed: 46,
        },
        SyntheticCase {
            name: "problem_nodes_10",
            scores: descending(10),
            sub_criteria: vec![],
            judge: perfect,
            trial: TrialConfig {
                trials: 10,
                perturbation: PerturbationConfig {
                    problem_nodes: 3,
                    problem_node_win_pct: 80.0,
                    edge_cut_pct: 10.0,
                    flip_pct: 0.0,
                },
                seed: Some(11),
                ..TrialConfig::default()
            },
            seed: 47,
        },
        SyntheticCase {
            name: "cyclic_triad",
            scores: vec![3.0, 2.0, 2.0],
            sub_criteria: vec![
                vec![true, true],
                vec![true, false, false],
                vec![true, true, true],
            ],
            judge: SimulatedJudge::Scripted(vec![
                (0, 1, Decision::A),
                (1, 0, Decision::B),
                (1, 2, Decision::A),
                (2, 1, Decision::B),
                (2, 0, Decision::A),
                (0, 2, Decision::B),
            ]),
            trial: TrialConfig {
                method: AggregationMethod::NetWins,
                ..TrialConfig::default()
            },
            seed: 48,
        },
    ]
}

pub fn run_synthetic_suite(filter: Option<&str>) -> Result<Vec<SyntheticResult>, ConfigError> {
    let cases = synthetic_cases();
    let selected: Vec<SyntheticCase> = match filter {
        Some(name) => cases.into_iter().filter(|c| c.name == name).collect(),
        None => cases,
    };

    selected.iter().map(run_synthetic_case).collect()
}

pub fn run_synthetic_case(case: &SyntheticCase) -> Result<SyntheticResult, ConfigError> {
    let input = synthetic_input(case);
    let context = EvaluationContext::new(input);
    let evaluation = context.evaluate(&case.trial)?;
    let rep = &evaluation.representative;

    let post = &rep.delta_accuracy;
    let pre = &rep.pre_aggregation_accuracy;
    let mut deltas: Vec<f64> = post.deltas().chain(pre.deltas()).collect();
    deltas.sort_by(f64::total_cmp);
    deltas.dedup();
    let curve = deltas
        .into_iter()
        .map(|delta| CurvePoint {
            delta,
            post_accuracy: post.accuracy_at(delta),
            pre_accuracy: pre.accuracy_at(delta),
        })
        .collect();

    Ok(SyntheticResult {
        case_name: case.name.to_string(),
        method: case.trial.method,
        metrics: SyntheticMetrics {
            ranking_accuracy: evaluation.headline.ranking_accuracy,
            standard_error: evaluation.statistics.as_ref().map(|s| s.standard_error),
            baseline_accuracy: evaluation.baseline_accuracy,
            bucket_overall: evaluation.headline.bucket_overall.accuracy,
            pre_aggregation_accuracy: evaluation.headline.pre_aggregation_overall.accuracy,
            consistency_rate: evaluation.consistency.consistency_rate,
            contradictions: evaluation.contradictions.contradictions.len(),
            inaccurate_predictions: evaluation.prediction_quality.inaccurate.len(),
            backward_weight: rep.ranking.backward_weight,
            judgments: context.judgments().len(),
            items: case.scores.len(),
        },
        ranking: rep.ranking.entries.iter().map(|e| e.item.clone()).collect(),
        curve,
    })
}

/// Judgments, ground truth and feedback for `case`.
pub fn synthetic_input(case: &SyntheticCase) -> EvaluationInput {
    let ids: Vec<String> = (0..case.scores.len()).map(item_id).collect();
    let ground_truth: GroundTruth = ids
        .iter()
        .cloned()
        .zip(case.scores.iter().copied())
        .collect();

    let mut feedback = Feedback::new();
    for (id, flags) in ids.iter().zip(&case.sub_criteria) {
        feedback.insert(id.as_str(), ItemFeedback::from_flags(flags));
    }

    let judgments = match &case.judge {
        SimulatedJudge::Scripted(script) => script
            .iter()
            .filter(|(a, b, _)| *a < ids.len() && *b < ids.len())
            .map(|&(a, b, decision)| {
                Judgment::new(ids[a].as_str(), ids[b].as_str(), decision)
                    .with_rationale("scripted")
            })
            .collect(),
        SimulatedJudge::Logistic {
            noise_scale,
            position_bias,
            tie_rate,
            coverage,
        } => {
            let mut rng = StdRng::seed_from_u64(case.seed);
            let mut judgments = Vec::new();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    if rng.gen::<f64>() >= *coverage {
                        continue;
                    }
                    for (a, b) in [(i, j), (j, i)] {
                        let decision = simulate_pairwise(
                            &mut rng,
                            case.scores[a],
                            case.scores[b],
                            *noise_scale,
                            *position_bias,
                            *tie_rate,
                        );
                        judgments.push(Judgment::new(ids[a].as_str(), ids[b].as_str(), decision));
                    }
                }
            }
            judgments
        }
    };

    EvaluationInput {
        judgments,
        ground_truth,
        feedback,
    }
}

// =============================================================================
// Simulator internals
// =============================================================================

fn item_id(i: usize) -> String {
    format!("item_{i:02}")
}

fn descending(n: usize) -> Vec<f64> {
    (0..n).map(|i| (n - i) as f64).collect()
}

fn simulate_pairwise(
    rng: &mut impl Rng,
    score_a: f64,
    score_b: f64,
    noise_scale: f64,
    position_bias: f64,
    tie_rate: f64,
) -> Decision {
    if tie_rate > 0.0 && rng.gen::<f64>() < tie_rate {
        return Decision::Tie;
    }

    let gap = score_a - score_b;
    let p_a = if noise_scale > 0.0 {
        1.0 / (1.0 + (-gap / noise_scale).exp())
    } else if gap > 0.0 {
        1.0
    } else if gap < 0.0 {
        0.0
    } else {
        0.5
    };
    let p_a = (p_a + position_bias).clamp(0.0, 1.0);

    if rng.gen::<f64>() < p_a {
        Decision::A
    } else {
        Decision::B
    }
}
