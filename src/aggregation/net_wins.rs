//! Net-wins ranking.

use crate::graph::JudgmentGraph;

/// Item indices sorted by net wins, descending.
///
/// The sort is stable, so equal scores keep first-seen item order. This is
/// also the seed ordering for the feedback-arc-set search.
pub fn net_wins_order(graph: &JudgmentGraph) -> Vec<usize> {
    let scores: Vec<i64> = (0..graph.len()).map(|i| graph.net_wins(i)).collect();
    let mut order: Vec<usize> = (0..graph.len()).collect();
    order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));
    order
}

/// Competition ranks ("1224"): rank = 1 + number of strictly higher scores.
///
/// `order` must already be sorted by `scores` descending; the result is
/// indexed by position in `order`.
pub fn competition_ranks(order: &[usize], scores: &[i64]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(order.len());
    let mut rank = 1usize;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && scores[idx] < scores[order[pos - 1]] {
            rank = pos + 1;
        }
        ranks.push(rank);
    }
    ranks
}
