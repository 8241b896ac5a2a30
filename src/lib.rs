#![forbid(unsafe_code)]

//! # ordinal-harness
//!
//! Turn noisy pairwise judgments into a global ranking, and measure how good
//! that ranking is.
//!
//! A judge (human or model) compares items two at a time. The same pair is
//! often shown in both orders, so order-reversal contradictions are found
//! and removed first. The surviving judgments form a weighted directed
//! graph, ranked either by net wins or by a local-search approximation of
//! the minimum feedback arc set. Rankings are scored against ground-truth
//! scores overall and per score gap ("delta"). A Monte Carlo trial runner
//! measures how the ranking holds up when synthetic items are injected and
//! judgments are corrupted.

pub mod accuracy;
pub mod aggregation;
pub mod contradiction;
pub mod error;
pub mod graph;
pub mod judgment;
pub mod perturbation;
pub mod report;
pub mod synthetic;
pub mod trials;

pub use accuracy::{
    accuracy_by_delta_from_rankings, find_inaccurate_predictions, pre_aggregation_accuracy,
    pre_aggregation_accuracy_by_delta, ranking_accuracy, BucketTotals, DeltaBucket, DeltaBuckets,
    InaccuratePrediction, PairwiseAccuracy,
};
pub use aggregation::{
    aggregate, aggregate_with_items, AggregationMethod, FasConfig, Ranking, RankingEntry,
};
pub use contradiction::{
    find_contradictions, remove_contradictions, ConsistencySummary, Contradiction,
    ContradictionReport,
};
pub use error::{ConfigError, InputError};
pub use graph::JudgmentGraph;
pub use judgment::{Decision, EvaluationInput, Feedback, GroundTruth, ItemFeedback, Judgment};
pub use perturbation::{apply_perturbations, PerturbationConfig, PerturbationStats};
pub use report::{build_report, render_report_markdown, EvaluationReport, ReportOptions};
pub use trials::{
    run_trial, run_trials, Evaluation, EvaluationContext, TrialConfig, TrialOutcome,
    TrialStatistics,
};
