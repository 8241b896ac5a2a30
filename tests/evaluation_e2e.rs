use ordinal_harness::synthetic::{run_synthetic_suite, synthetic_cases};

fn assert_pct(x: f64) {
    assert!(
        x.is_finite() && (0.0..=100.0).contains(&x),
        "expected percentage in [0,100], got {x}"
    );
}

#[test]
fn synthetic_suite_filter_selects_exact_name() {
    let all = synthetic_cases();
    assert!(all.iter().any(|c| c.name == "clean_ordering_10"));

    let selected = run_synthetic_suite(Some("clean_ordering_10")).unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].case_name, "clean_ordering_10");

    assert!(run_synthetic_suite(Some("no_such_case")).unwrap().is_empty());
}

#[test]
fn every_case_reports_valid_percentages() {
    let results = run_synthetic_suite(None).unwrap();
    assert_eq!(results.len(), synthetic_cases().len());
    for r in &results {
        let m = &r.metrics;
        assert_pct(m.ranking_accuracy);
        assert_pct(m.baseline_accuracy);
        assert_pct(m.bucket_overall);
        assert_pct(m.pre_aggregation_accuracy);
        assert_pct(m.consistency_rate);
        for point in &r.curve {
            assert_pct(point.post_accuracy);
            assert_pct(point.pre_accuracy);
        }
    }
}

#[test]
fn clean_ordering_case_is_perfect() {
    let result = &run_synthetic_suite(Some("clean_ordering_10")).unwrap()[0];
    let m = &result.metrics;
    assert_eq!(m.ranking_accuracy, 100.0);
    assert_eq!(m.baseline_accuracy, 100.0);
    assert_eq!(m.backward_weight, 0);
    assert_eq!(m.contradictions, 0);
    assert_eq!(result.ranking.first().map(String::as_str), Some("item_00"));
    assert_eq!(result.ranking.last().map(String::as_str), Some("item_09"));
}

#[test]
fn cyclic_triad_ties_under_net_wins() {
    let result = &run_synthetic_suite(Some("cyclic_triad")).unwrap()[0];
    let m = &result.metrics;
    assert_eq!(m.items, 3);
    assert_eq!(m.judgments, 6);
    assert_eq!(m.consistency_rate, 100.0);
    assert_eq!(m.contradictions, 0);
    assert_eq!(m.backward_weight, 1);
    assert_eq!(m.ranking_accuracy, 0.0);
}

#[test]
fn position_bias_shows_up_as_contradictions() {
    let result = &run_synthetic_suite(Some("position_biased_12")).unwrap()[0];
    assert!(result.metrics.contradictions > 0);
    assert!(result.metrics.consistency_rate < 100.0);
}

#[test]
fn perturbed_cases_report_trial_error() {
    for name in ["sparse_coverage_30", "problem_nodes_10"] {
        let result = &run_synthetic_suite(Some(name)).unwrap()[0];
        let se = result
            .metrics
            .standard_error
            .expect("perturbed case should run trials");
        assert!(se.is_finite() && se >= 0.0);
    }
}

#[test]
fn problem_nodes_appear_in_the_ranking() {
    let result = &run_synthetic_suite(Some("problem_nodes_10")).unwrap()[0];
    assert!(result.ranking.iter().any(|id| id.starts_with("problem_")));
    assert_eq!(result.metrics.items, 10);
}
