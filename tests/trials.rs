use rand::rngs::StdRng;
use rand::SeedableRng;

use ordinal_harness::aggregation::AggregationMethod;
use ordinal_harness::error::ConfigError;
use ordinal_harness::judgment::{Decision, EvaluationInput, Feedback, GroundTruth, Judgment};
use ordinal_harness::perturbation::PerturbationConfig;
use ordinal_harness::trials::{run_trials, EvaluationContext, TrialConfig};

/// Five items, every pair judged both ways, one contradictory pair.
fn input() -> EvaluationInput {
    let scores = [5.0, 4.0, 3.0, 2.0, 1.0];
    let ids: Vec<String> = (0..scores.len()).map(|i| format!("s{i}")).collect();
    let mut judgments = Vec::new();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            judgments.push(Judgment::new(ids[i].as_str(), ids[j].as_str(), Decision::A));
            // s3 vs s4 is judged by position, so it contradicts itself.
            let reverse = if (i, j) == (3, 4) { Decision::A } else { Decision::B };
            judgments.push(Judgment::new(ids[j].as_str(), ids[i].as_str(), reverse));
        }
    }
    EvaluationInput {
        judgments,
        ground_truth: ids.iter().cloned().zip(scores).collect(),
        feedback: Feedback::new(),
    }
}

#[test]
fn identical_trials_have_zero_standard_error() {
    let input = input();
    let cfg = TrialConfig {
        trials: 6,
        ..TrialConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let run = run_trials(
        &input.judgments,
        &input.ground_truth,
        &input.feedback,
        &cfg,
        &mut rng,
    );

    let stats = &run.statistics;
    assert_eq!(stats.trial_count, 6);
    assert_eq!(stats.standard_error, 0.0);
    assert_eq!(stats.mean_accuracy, run.representative.ranking_accuracy.accuracy);
    assert_eq!(stats.min_accuracy, stats.max_accuracy);
    assert!(stats.delta_summary.iter().all(|d| d.standard_error == 0.0));
}

#[test]
fn contradictions_are_removed_but_still_counted() {
    let input = input();
    let context = EvaluationContext::new(input);
    let eval = context.evaluate(&TrialConfig::default()).unwrap();

    assert_eq!(eval.contradictions.contradictions.len(), 1);
    assert_eq!(eval.representative.contradictions_removed, 2);
    assert_eq!(eval.consistency.bidirectional_pairs, 10);
    assert_eq!(eval.consistency.inconsistent_pairs, 1);
    assert!((eval.consistency.consistency_rate - 90.0).abs() < 1e-9);

    let s3 = eval
        .representative
        .ranking
        .entries
        .iter()
        .find(|e| e.item == "s3")
        .unwrap();
    assert_eq!(s3.contradictions, 1);

    // s3 and s4 tie on net wins; the FAS keeps first-seen order.
    assert_eq!(eval.headline.ranking_accuracy, 100.0);
    assert!(eval.statistics.is_none());
    assert!(eval.delta_vs_baseline.is_none());
}

#[test]
fn zero_trials_is_rejected_before_running() {
    let context = EvaluationContext::new(input());
    let cfg = TrialConfig {
        trials: 0,
        ..TrialConfig::default()
    };
    assert_eq!(
        context.evaluate(&cfg).unwrap_err(),
        ConfigError::InvalidTrialCount(0)
    );
}

#[test]
fn out_of_range_percentages_are_rejected() {
    let context = EvaluationContext::new(input());
    let cfg = TrialConfig {
        perturbation: PerturbationConfig {
            edge_cut_pct: -1.0,
            ..PerturbationConfig::default()
        },
        ..TrialConfig::default()
    };
    assert!(matches!(
        context.evaluate(&cfg),
        Err(ConfigError::PercentOutOfRange { .. })
    ));
}

#[test]
fn seeded_perturbed_runs_reproduce() {
    let cfg = TrialConfig {
        trials: 8,
        perturbation: PerturbationConfig {
            problem_nodes: 2,
            problem_node_win_pct: 60.0,
            edge_cut_pct: 20.0,
            flip_pct: 15.0,
        },
        seed: Some(1234),
        ..TrialConfig::default()
    };
    let a = EvaluationContext::new(input()).evaluate(&cfg).unwrap();
    let b = EvaluationContext::new(input()).evaluate(&cfg).unwrap();

    let sa = a.statistics.as_ref().unwrap();
    let sb = b.statistics.as_ref().unwrap();
    assert_eq!(sa.trial_count, 8);
    assert_eq!(sa.trial_accuracies, sb.trial_accuracies);
    assert_eq!(a.representative.judgments, b.representative.judgments);
    assert_eq!(
        a.delta_vs_baseline,
        Some(sa.mean_accuracy - a.baseline_accuracy)
    );
}

#[test]
fn baseline_is_shared_across_evaluations() {
    let context = EvaluationContext::new(input());
    let baseline = context.evaluate(&TrialConfig::default()).unwrap();
    let perturbed = context
        .evaluate(&TrialConfig {
            trials: 3,
            perturbation: PerturbationConfig {
                flip_pct: 50.0,
                ..PerturbationConfig::default()
            },
            seed: Some(9),
            ..TrialConfig::default()
        })
        .unwrap();

    assert_eq!(baseline.baseline_accuracy, baseline.headline.ranking_accuracy);
    assert_eq!(perturbed.baseline_accuracy, baseline.baseline_accuracy);
}

#[test]
fn methods_cache_separate_baselines() {
    let context = EvaluationContext::new(input());
    let net = context.baseline_accuracy(AggregationMethod::NetWins, &Default::default());
    let fas = context.baseline_accuracy(AggregationMethod::FeedbackArcSet, &Default::default());
    assert!(net.is_finite() && fas.is_finite());
    assert_eq!(
        context.baseline_accuracy(AggregationMethod::NetWins, &Default::default()),
        net
    );
}

#[test]
fn empty_input_scores_zero_without_failing() {
    let context = EvaluationContext::new(EvaluationInput {
        judgments: vec![],
        ground_truth: GroundTruth::new(),
        feedback: Feedback::new(),
    });
    let eval = context.evaluate(&TrialConfig::default()).unwrap();
    assert_eq!(eval.headline.ranking_accuracy, 0.0);
    assert_eq!(eval.consistency.consistency_rate, 100.0);
    assert!(eval.representative.ranking.entries.is_empty());
}

/// Six items in a clean chain, every pair judged once.
fn chain_input() -> EvaluationInput {
    let ids: Vec<String> = (0..6).map(|i| format!("c{i}")).collect();
    let mut judgments = Vec::new();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            judgments.push(Judgment::new(ids[i].as_str(), ids[j].as_str(), Decision::A));
        }
    }
    EvaluationInput {
        judgments,
        ground_truth: ids.iter().cloned().zip([6.0, 5.0, 4.0, 3.0, 2.0, 1.0]).collect(),
        feedback: Feedback::new(),
    }
}

#[test]
fn bucket_totals_do_not_shrink_when_edges_are_cut() {
    let input = chain_input();
    let cfg = TrialConfig {
        method: AggregationMethod::NetWins,
        trials: 8,
        perturbation: PerturbationConfig {
            edge_cut_pct: 50.0,
            ..PerturbationConfig::default()
        },
        ..TrialConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let run = run_trials(
        &input.judgments,
        &input.ground_truth,
        &input.feedback,
        &cfg,
        &mut rng,
    );

    let totals: Vec<f64> = run
        .statistics
        .delta_accuracies
        .iter()
        .map(|b| b.overall().total)
        .collect();
    assert_eq!(totals, vec![15.0; 8]);
    for bucket in run.statistics.delta_summary {
        assert_eq!(bucket.total, 6.0 - bucket.delta);
    }
}

#[test]
fn contradiction_only_items_keep_their_row() {
    let input = EvaluationInput {
        judgments: vec![
            Judgment::new("a", "b", Decision::A),
            Judgment::new("b", "a", Decision::B),
            Judgment::new("c", "a", Decision::A),
            Judgment::new("a", "c", Decision::A),
        ],
        ground_truth: [("a".to_string(), 2.0), ("b".to_string(), 1.0), ("c".to_string(), 3.0)]
            .into_iter()
            .collect(),
        feedback: Feedback::new(),
    };
    let eval = EvaluationContext::new(input)
        .evaluate(&TrialConfig::default())
        .unwrap();

    let entries = &eval.representative.ranking.entries;
    assert_eq!(entries.len(), 3);
    let c = entries.iter().find(|e| e.item == "c").unwrap();
    assert_eq!(c.contradictions, 1);
    assert_eq!((c.wins, c.losses, c.score), (0, 0, 0));
}
