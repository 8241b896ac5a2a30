//! Minimum feedback arc set by bounded local search over orderings.
//!
//! An edge `u → v` (u beat v) is backward when `v` sits before `u`. The
//! search starts from a seed ordering and applies first-improvement swaps:
//! every pass scans adjacent positions; a pass that finds nothing, landing
//! on an iteration that is a multiple of `wide_search_every`, tries one
//! wider swap within a forward window before giving up. There is no
//! randomness, so the result is a pure function of graph and seed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::JudgmentGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FasConfig {
    /// Cap on passes.
    pub max_iterations: usize,
    /// Wide search is attempted on iterations divisible by this.
    pub wide_search_every: usize,
    /// Wide swaps pair position `i` with `i+2 .. i+wide_window` (exclusive).
    pub wide_window: usize,
}

impl Default for FasConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            wide_search_every: 10,
            wide_window: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FasOutcome {
    /// Final ordering of item indices, best first.
    pub order: Vec<usize>,
    pub seed_weight: u64,
    pub final_weight: u64,
    pub iterations: usize,
}

/// Total weight of edges pointing backward in `order`.
pub fn backward_weight(graph: &JudgmentGraph, order: &[usize]) -> u64 {
    let mut position = vec![usize::MAX; graph.len()];
    for (pos, &idx) in order.iter().enumerate() {
        position[idx] = pos;
    }
    graph
        .edges()
        .filter(|&(from, to, _)| position[to] < position[from])
        .map(|(_, _, w)| u64::from(w))
        .sum()
}

/// Change in backward weight if `order[i]` and `order[j]` swap (`i < j`).
///
/// Only pairs whose relative order flips contribute: the two swapped items
/// with each other, and each of them with every item strictly between.
fn swap_delta(graph: &JudgmentGraph, order: &[usize], i: usize, j: usize) -> i64 {
    let w = |from: usize, to: usize| i64::from(graph.weight(from, to));
    let x = order[i];
    let y = order[j];
    let mut delta = w(x, y) - w(y, x);
    for &m in &order[i + 1..j] {
        delta += w(x, m) - w(m, x);
        delta += w(m, y) - w(y, m);
    }
    delta
}

/// Refines `seed` to reduce total backward-edge weight.
///
/// Never returns an ordering worse than the seed: only strictly improving
/// swaps are accepted.
pub fn minimize_backward_weight(
    graph: &JudgmentGraph,
    seed: Vec<usize>,
    cfg: &FasConfig,
) -> FasOutcome {
    let mut order = seed;
    let n = order.len();
    let seed_weight = backward_weight(graph, &order);
    let mut current = seed_weight as i64;

    let mut improved = true;
    let mut iterations = 0usize;

    while improved && iterations < cfg.max_iterations {
        improved = false;
        iterations += 1;

        for i in 0..n.saturating_sub(1) {
            let delta = swap_delta(graph, &order, i, i + 1);
            if delta < 0 {
                order.swap(i, i + 1);
                current += delta;
                improved = true;
            }
        }

        if !improved && cfg.wide_search_every > 0 && iterations % cfg.wide_search_every == 0 {
            'wide: for i in 0..n {
                for j in (i + 2)..(i + cfg.wide_window).min(n) {
                    let delta = swap_delta(graph, &order, i, j);
                    if delta < 0 {
                        order.swap(i, j);
                        current += delta;
                        improved = true;
                        break 'wide;
                    }
                }
            }
        }
    }

    let final_weight = current.max(0) as u64;
    debug!(
        seed_weight,
        final_weight, iterations, "feedback arc set search finished"
    );

    FasOutcome {
        order,
        seed_weight,
        final_weight,
        iterations,
    }
}
