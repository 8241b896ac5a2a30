//! Controlled corruption of a judgment list for robustness analysis.
//!
//! Every operator takes an immutable list and returns a new one. Randomness
//! comes from the caller's `Rng`, one independent draw per judgment or pair.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{check_percent, ConfigError};
use crate::judgment::{item_ids, Decision, Judgment};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Synthetic items injected into the graph.
    #[serde(default)]
    pub problem_nodes: usize,
    /// Chance (percent) that a problem node wins each of its judgments against a real item.
    #[serde(default)]
    pub problem_node_win_pct: f64,
    /// Chance (percent) that each judgment is dropped.
    #[serde(default)]
    pub edge_cut_pct: f64,
    /// Chance (percent) that each non-tie decision is reversed.
    #[serde(default)]
    pub flip_pct: f64,
}

impl PerturbationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent("problem_node_win_pct", self.problem_node_win_pct)?;
        check_percent("edge_cut_pct", self.edge_cut_pct)?;
        check_percent("flip_pct", self.flip_pct)?;
        Ok(())
    }

    /// No perturbation at all: the canonical baseline.
    pub fn is_baseline(&self) -> bool {
        self.problem_nodes == 0 && self.edge_cut_pct == 0.0 && self.flip_pct == 0.0
    }
}

/// What the operators actually did in one application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerturbationStats {
    pub synthetic_added: usize,
    pub edges_cut: usize,
    pub decisions_flipped: usize,
}

fn draw_pct(rng: &mut impl Rng, pct: f64) -> bool {
    rng.gen::<f64>() * 100.0 < pct
}

/// Synthetic identifiers `problem_1..=n`, skipping any that collide with `taken`.
fn problem_node_ids(n: usize, taken: &HashSet<&str>) -> Vec<String> {
    let mut ids = Vec::with_capacity(n);
    let mut k = 1usize;
    while ids.len() < n {
        let candidate = format!("problem_{k}");
        if !taken.contains(candidate.as_str()) {
            ids.push(candidate);
        }
        k += 1;
    }
    ids
}

/// Appends `n` synthetic items with random judgments against every real item
/// and each other.
///
/// For each (synthetic, real) pair, two judgments are drawn independently,
/// one in each orientation, each won by the synthetic item with probability
/// `win_pct / 100`; the pair may therefore contradict itself. Synthetic pairs
/// get two independent 50/50 judgments. All injected judgments are tagged
/// synthetic.
pub fn add_problem_nodes(
    judgments: &[Judgment],
    n: usize,
    win_pct: f64,
    rng: &mut impl Rng,
) -> Vec<Judgment> {
    let mut result = judgments.to_vec();
    if n == 0 {
        return result;
    }

    let real_ids = item_ids(judgments);
    let taken: HashSet<&str> = real_ids.iter().map(String::as_str).collect();
    let problem_ids = problem_node_ids(n, &taken);

    let real_note = format!("[Problem node: random outcome with {win_pct}% win rate]");
    for problem in &problem_ids {
        for real in &real_ids {
            let forward = if draw_pct(rng, win_pct) {
                Decision::A
            } else {
                Decision::B
            };
            result.push(
                Judgment::new(problem.as_str(), real.as_str(), forward)
                    .with_rationale(real_note.as_str())
                    .synthetic(),
            );

            let backward = if draw_pct(rng, win_pct) {
                Decision::B
            } else {
                Decision::A
            };
            result.push(
                Judgment::new(real.as_str(), problem.as_str(), backward)
                    .with_rationale(real_note.as_str())
                    .synthetic(),
            );
        }
    }

    for (i, first) in problem_ids.iter().enumerate() {
        for second in &problem_ids[i + 1..] {
            for (a, b) in [(first, second), (second, first)] {
                let decision = if rng.gen_bool(0.5) {
                    Decision::A
                } else {
                    Decision::B
                };
                result.push(
                    Judgment::new(a.as_str(), b.as_str(), decision)
                        .with_rationale("[Problem node: random outcome]")
                        .synthetic(),
                );
            }
        }
    }

    debug!(
        problem_nodes = n,
        real_items = real_ids.len(),
        added = result.len() - judgments.len(),
        "added problem nodes"
    );
    result
}

/// Keeps each judgment independently with probability `(100 - cut_pct) / 100`.
///
/// No minimum is enforced; heavy cutting can disconnect the graph.
pub fn cut_edges(judgments: &[Judgment], cut_pct: f64, rng: &mut impl Rng) -> Vec<Judgment> {
    let kept: Vec<Judgment> = judgments
        .iter()
        .filter(|_| !draw_pct(rng, cut_pct))
        .cloned()
        .collect();
    debug!(
        requested_pct = cut_pct,
        cut = judgments.len() - kept.len(),
        total = judgments.len(),
        "cut edges"
    );
    kept
}

/// Reverses each non-tie decision independently with probability `flip_pct / 100`.
///
/// Ties are never altered.
pub fn flip_decisions(judgments: &[Judgment], flip_pct: f64, rng: &mut impl Rng) -> Vec<Judgment> {
    let mut flipped = 0usize;
    let result: Vec<Judgment> = judgments
        .iter()
        .map(|j| {
            let mut out = j.clone();
            if draw_pct(rng, flip_pct) && !j.decision.is_tie() {
                out.decision = j.decision.flipped();
                flipped += 1;
            }
            out
        })
        .collect();
    debug!(
        requested_pct = flip_pct,
        flipped,
        total = judgments.len(),
        "flipped decisions"
    );
    result
}

/// Problem nodes, then edge cutting, then flipping. Injected judgments are
/// themselves subject to the later steps.
pub fn apply_perturbations(
    judgments: &[Judgment],
    cfg: &PerturbationConfig,
    rng: &mut impl Rng,
) -> (Vec<Judgment>, PerturbationStats) {
    let mut stats = PerturbationStats::default();

    let with_nodes = add_problem_nodes(judgments, cfg.problem_nodes, cfg.problem_node_win_pct, rng);
    stats.synthetic_added = with_nodes.len() - judgments.len();

    let cut = if cfg.edge_cut_pct > 0.0 {
        cut_edges(&with_nodes, cfg.edge_cut_pct, rng)
    } else {
        with_nodes.clone()
    };
    stats.edges_cut = with_nodes.len() - cut.len();

    let flipped = if cfg.flip_pct > 0.0 {
        flip_decisions(&cut, cfg.flip_pct, rng)
    } else {
        cut.clone()
    };
    stats.decisions_flipped = cut
        .iter()
        .zip(&flipped)
        .filter(|(before, after)| before.decision != after.decision)
        .count();

    (flipped, stats)
}
