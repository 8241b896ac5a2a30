//! Ranking aggregation over the judgment graph.
//!
//! Two methods:
//! - Net wins: score = outgoing − incoming weight, competition ranks.
//! - Feedback arc set: net-wins seed refined by local search that minimizes
//!   total backward-edge weight, strict ranks.
//!
//! Both build the graph with contradictory pairs excluded (see
//! [`crate::graph`]); callers are still expected to run
//! [`crate::contradiction::remove_contradictions`] first.

pub mod feedback_arc;
pub mod net_wins;

use serde::{Deserialize, Serialize};

use crate::graph::{ItemIndex, JudgmentGraph};
use crate::judgment::{GroundTruth, Judgment};

pub use feedback_arc::{backward_weight, minimize_backward_weight, FasConfig, FasOutcome};
pub use net_wins::{competition_ranks, net_wins_order};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMethod {
    NetWins,
    #[default]
    FeedbackArcSet,
}

impl AggregationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationMethod::NetWins => "net-wins",
            AggregationMethod::FeedbackArcSet => "feedback-arc-set",
        }
    }
}

/// One row of a ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub item: String,
    /// 1-based. Net wins shares ranks on equal score; FAS ranks are strict.
    pub rank: usize,
    /// Net wins.
    pub score: i64,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub contradictions: u32,
    /// Incoming weight from items placed below this one.
    pub fas_edges: u32,
    pub ground_truth: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub method: AggregationMethod,
    pub entries: Vec<RankingEntry>,
    /// Total backward-edge weight of the final ordering.
    pub backward_weight: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<FasOutcome>,
}

impl Ranking {
    pub fn rank_of(&self, item: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.item == item).map(|e| e.rank)
    }
}

/// Builds the graph from `judgments` and ranks it with `method`.
pub fn aggregate(
    judgments: &[Judgment],
    method: AggregationMethod,
    ground_truth: &GroundTruth,
    fas: &FasConfig,
) -> Ranking {
    let graph = JudgmentGraph::build(judgments);
    rank_graph(&graph, method, ground_truth, fas)
}

/// Like [`aggregate`], but every item in `items` is ranked even when
/// `judgments` no longer mention it.
pub fn aggregate_with_items(
    items: ItemIndex,
    judgments: &[Judgment],
    method: AggregationMethod,
    ground_truth: &GroundTruth,
    fas: &FasConfig,
) -> Ranking {
    let graph = JudgmentGraph::build_with_items(items, judgments);
    rank_graph(&graph, method, ground_truth, fas)
}

pub fn rank_graph(
    graph: &JudgmentGraph,
    method: AggregationMethod,
    ground_truth: &GroundTruth,
    fas: &FasConfig,
) -> Ranking {
    match method {
        AggregationMethod::NetWins => {
            let order = net_wins_order(graph);
            let scores: Vec<i64> = (0..graph.len()).map(|i| graph.net_wins(i)).collect();
            let ranks = competition_ranks(&order, &scores);
            Ranking {
                method,
                backward_weight: backward_weight(graph, &order),
                entries: entries_from_order(graph, &order, &ranks, ground_truth),
                search: None,
            }
        }
        AggregationMethod::FeedbackArcSet => {
            let outcome = minimize_backward_weight(graph, net_wins_order(graph), fas);
            let ranks: Vec<usize> = (1..=outcome.order.len()).collect();
            Ranking {
                method,
                backward_weight: outcome.final_weight,
                entries: entries_from_order(graph, &outcome.order, &ranks, ground_truth),
                search: Some(outcome),
            }
        }
    }
}

/// Materializes ranking rows for `order`; `ranks[pos]` is the rank at `pos`.
pub(crate) fn entries_from_order(
    graph: &JudgmentGraph,
    order: &[usize],
    ranks: &[usize],
    ground_truth: &GroundTruth,
) -> Vec<RankingEntry> {
    order
        .iter()
        .enumerate()
        .map(|(pos, &idx)| {
            let fas_edges = order[pos + 1..]
                .iter()
                .map(|&below| graph.weight(below, idx))
                .sum();
            let item = graph.items().id(idx).to_string();
            RankingEntry {
                ground_truth: ground_truth.score(&item),
                item,
                rank: ranks[pos],
                score: graph.net_wins(idx),
                wins: graph.wins(idx),
                losses: graph.losses(idx),
                ties: graph.tie_count(idx),
                contradictions: graph.contradiction_count(idx),
                fas_edges,
            }
        })
        .collect()
}
