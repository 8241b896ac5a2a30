//! Weighted win graph over dense item indices.
//!
//! Items are interned once into an [`ItemIndex`]; the graph is a dense
//! `n × n` weight matrix keyed by index, where `weight(u, v)` counts the
//! judgments naming `u` the winner over `v`.
//!
//! Edge policy for each unique unordered pair:
//! - one direction only: every judgment in that orientation adds `+1` to
//!   its winner's edge (ties add nothing);
//! - both directions, contradictory: no edge, and both endpoints get their
//!   contradiction counter bumped;
//! - both directions, consistent: a single `+1` edge for the forward
//!   (first-seen) winner. A forward tie contributes nothing; the reverse
//!   judgment only corroborates.

use std::collections::HashMap;

use crate::judgment::{item_ids, unique_pairs, Judgment};

/// Identifier ↔ dense index mapping, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl ItemIndex {
    pub fn from_judgments(judgments: &[Judgment]) -> Self {
        let mut index = Self::default();
        for id in item_ids(judgments) {
            index.intern(&id);
        }
        index
    }

    pub fn intern(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.lookup.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id.to_string());
        self.lookup.insert(id.to_string(), idx);
        idx
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    pub fn id(&self, idx: usize) -> &str {
        &self.ids[idx]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct JudgmentGraph {
    items: ItemIndex,
    weights: Vec<u32>,
    contradictions: Vec<u32>,
    ties: Vec<u32>,
}

impl JudgmentGraph {
    pub fn build(judgments: &[Judgment]) -> Self {
        Self::build_with_items(ItemIndex::default(), judgments)
    }

    /// Builds over a pre-seeded item set. Items in `items` that no judgment
    /// mentions stay in the graph as isolated nodes; ids first seen in
    /// `judgments` are appended after them.
    pub fn build_with_items(mut items: ItemIndex, judgments: &[Judgment]) -> Self {
        for id in item_ids(judgments) {
            items.intern(&id);
        }
        let n = items.len();
        let mut graph = Self {
            items,
            weights: vec![0; n * n],
            contradictions: vec![0; n],
            ties: vec![0; n],
        };

        for j in judgments {
            if j.decision.is_tie() && j.item_a != j.item_b {
                for id in [&j.item_a, &j.item_b] {
                    if let Some(idx) = graph.items.index_of(id) {
                        graph.ties[idx] += 1;
                    }
                }
            }
        }

        for pair in unique_pairs(judgments) {
            if pair.is_bidirectional() {
                if pair.is_contradiction() {
                    graph.bump_contradiction(&pair.forward.item_a);
                    graph.bump_contradiction(&pair.forward.item_b);
                    continue;
                }
                graph.add_judgment(pair.forward);
            } else {
                for j in &pair.same_direction {
                    graph.add_judgment(j);
                }
            }
        }

        graph
    }

    fn add_judgment(&mut self, judgment: &Judgment) {
        let (Some(winner), Some(loser)) = (judgment.winner(), judgment.loser()) else {
            return;
        };
        if let (Some(w), Some(l)) = (self.items.index_of(winner), self.items.index_of(loser)) {
            let n = self.items.len();
            self.weights[w * n + l] += 1;
        }
    }

    fn bump_contradiction(&mut self, id: &str) {
        if let Some(idx) = self.items.index_of(id) {
            self.contradictions[idx] += 1;
        }
    }

    pub fn items(&self) -> &ItemIndex {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Accumulated wins of `from` over `to`.
    pub fn weight(&self, from: usize, to: usize) -> u32 {
        self.weights[from * self.items.len() + to]
    }

    pub fn wins(&self, idx: usize) -> u32 {
        (0..self.len()).map(|to| self.weight(idx, to)).sum()
    }

    pub fn losses(&self, idx: usize) -> u32 {
        (0..self.len()).map(|from| self.weight(from, idx)).sum()
    }

    /// Outgoing minus incoming weight.
    pub fn net_wins(&self, idx: usize) -> i64 {
        i64::from(self.wins(idx)) - i64::from(self.losses(idx))
    }

    pub fn contradiction_count(&self, idx: usize) -> u32 {
        self.contradictions[idx]
    }

    pub fn tie_count(&self, idx: usize) -> u32 {
        self.ties[idx]
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> u64 {
        self.weights.iter().map(|&w| u64::from(w)).sum()
    }

    /// Non-zero edges as `(from, to, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        let n = self.len();
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .map(move |(flat, &w)| (flat / n, flat % n, w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::Decision;

    fn j(a: &str, b: &str, d: Decision) -> Judgment {
        Judgment::new(a, b, d)
    }

    #[test]
    fn single_direction_duplicates_accumulate() {
        let g = JudgmentGraph::build(&[
            j("x", "y", Decision::A),
            j("x", "y", Decision::A),
            j("x", "y", Decision::B),
        ]);
        let x = g.items().index_of("x").unwrap();
        let y = g.items().index_of("y").unwrap();
        assert_eq!(g.weight(x, y), 2);
        assert_eq!(g.weight(y, x), 1);
        assert_eq!(g.net_wins(x), 1);
    }

    #[test]
    fn consistent_bidirectional_pair_counts_once() {
        let g = JudgmentGraph::build(&[j("x", "y", Decision::A), j("y", "x", Decision::B)]);
        assert_eq!(g.total_weight(), 1);
        let x = g.items().index_of("x").unwrap();
        assert_eq!(g.wins(x), 1);
    }

    #[test]
    fn contradictory_pair_adds_no_edge_and_counts_both_items() {
        let g = JudgmentGraph::build(&[
            j("x", "y", Decision::A),
            j("y", "x", Decision::A),
            j("y", "z", Decision::Tie),
        ]);
        assert_eq!(g.total_weight(), 0);
        let x = g.items().index_of("x").unwrap();
        let y = g.items().index_of("y").unwrap();
        let z = g.items().index_of("z").unwrap();
        assert_eq!(g.contradiction_count(x), 1);
        assert_eq!(g.contradiction_count(y), 1);
        assert_eq!(g.contradiction_count(z), 0);
        assert_eq!(g.tie_count(y), 1);
        assert_eq!(g.tie_count(z), 1);
    }

    #[test]
    fn forward_tie_with_decided_reverse_adds_nothing() {
        let g = JudgmentGraph::build(&[j("x", "y", Decision::Tie), j("y", "x", Decision::A)]);
        assert_eq!(g.total_weight(), 0);
        assert_eq!(g.edges().count(), 0);
    }

    #[test]
    fn seeded_items_survive_without_judgments() {
        let seed = ItemIndex::from_judgments(&[
            j("x", "y", Decision::A),
            j("y", "z", Decision::A),
        ]);
        let g = JudgmentGraph::build_with_items(
            seed,
            &[j("x", "y", Decision::A), j("problem_1", "x", Decision::A)],
        );
        assert_eq!(g.len(), 4);
        assert_eq!(g.items().ids(), ["x", "y", "z", "problem_1"]);
        let z = g.items().index_of("z").unwrap();
        assert_eq!(g.wins(z) + g.losses(z), 0);
        assert_eq!(g.net_wins(z), 0);
    }
}
