//! Judgment records, ground truth, and pair canonicalization.
//!
//! Wire shapes follow the run files produced by the comparison benchmark:
//! every judgment is directional (`item_a` was shown first) and carries a
//! decision in that perspective. The legacy `essay1_id` / `essay2_id` /
//! `reasoning` field names are accepted on input.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::error::InputError;

// =============================================================================
// Decisions and judgments
// =============================================================================

/// Outcome of one directional comparison, in the perspective of the judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// `item_a` won.
    #[serde(alias = "essay1")]
    A,
    /// `item_b` won.
    #[serde(alias = "essay2")]
    B,
    Tie,
}

impl Decision {
    /// The opposite decision. Ties stay ties.
    pub fn flipped(self) -> Self {
        match self {
            Decision::A => Decision::B,
            Decision::B => Decision::A,
            Decision::Tie => Decision::Tie,
        }
    }

    pub fn is_tie(self) -> bool {
        matches!(self, Decision::Tie)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentMetadata {
    /// Set on judgments injected by problem-node perturbation.
    #[serde(default)]
    pub synthetic: bool,
}

/// A single directional pairwise decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    #[serde(alias = "essay1_id")]
    pub item_a: String,
    #[serde(alias = "essay2_id")]
    pub item_b: String,
    pub decision: Decision,
    #[serde(default, alias = "reasoning", skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_metadata")]
    pub metadata: JudgmentMetadata,
}

fn is_default_metadata(meta: &JudgmentMetadata) -> bool {
    !meta.synthetic
}

impl Judgment {
    pub fn new(item_a: impl Into<String>, item_b: impl Into<String>, decision: Decision) -> Self {
        Self {
            item_a: item_a.into(),
            item_b: item_b.into(),
            decision,
            rationale: None,
            metadata: JudgmentMetadata::default(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.metadata.synthetic = true;
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.metadata.synthetic
    }

    /// Identifier of the winning item, `None` for a tie.
    pub fn winner(&self) -> Option<&str> {
        match self.decision {
            Decision::A => Some(&self.item_a),
            Decision::B => Some(&self.item_b),
            Decision::Tie => None,
        }
    }

    /// Identifier of the losing item, `None` for a tie.
    pub fn loser(&self) -> Option<&str> {
        match self.decision {
            Decision::A => Some(&self.item_b),
            Decision::B => Some(&self.item_a),
            Decision::Tie => None,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.item_a, &self.item_b)
    }

    pub fn names(&self, item: &str) -> bool {
        self.item_a == item || self.item_b == item
    }
}

// =============================================================================
// Pair canonicalization
// =============================================================================

/// Canonical identity of an unordered pair: the two identifiers, sorted.
///
/// `(x, y)` and `(y, x)` always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub low: String,
    pub high: String,
}

impl PairKey {
    pub fn new(x: &str, y: &str) -> Self {
        if x <= y {
            Self {
                low: x.to_string(),
                high: y.to_string(),
            }
        } else {
            Self {
                low: y.to_string(),
                high: x.to_string(),
            }
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// One unordered pair as observed in a judgment list.
///
/// `forward` is the first judgment seen for the pair; its orientation defines
/// the pair's forward direction. `reverse` is the last judgment recorded in the
/// opposite orientation, if any. `same_direction` holds every judgment sharing
/// the forward orientation, in input order (forward included).
#[derive(Debug, Clone)]
pub struct UniquePair<'a> {
    pub key: PairKey,
    pub forward: &'a Judgment,
    pub reverse: Option<&'a Judgment>,
    pub same_direction: Vec<&'a Judgment>,
}

impl<'a> UniquePair<'a> {
    pub fn is_bidirectional(&self) -> bool {
        self.reverse.is_some()
    }

    pub fn forward_winner(&self) -> Option<&'a str> {
        self.forward.winner()
    }

    pub fn reverse_winner(&self) -> Option<&'a str> {
        self.reverse.and_then(|r| r.winner())
    }

    /// Both directions named a winner and they disagree.
    pub fn is_contradiction(&self) -> bool {
        match (self.forward_winner(), self.reverse_winner()) {
            (Some(f), Some(b)) => f != b,
            _ => false,
        }
    }
}

/// Groups a judgment list into unique unordered pairs, in first-seen order.
///
/// Self-comparisons (`item_a == item_b`) carry no ordering signal and are skipped.
pub fn unique_pairs(judgments: &[Judgment]) -> Vec<UniquePair<'_>> {
    let mut last_by_order: HashMap<(&str, &str), &Judgment> = HashMap::new();
    let mut by_order: HashMap<(&str, &str), Vec<&Judgment>> = HashMap::new();
    for j in judgments {
        if j.item_a == j.item_b {
            continue;
        }
        let key = (j.item_a.as_str(), j.item_b.as_str());
        last_by_order.insert(key, j);
        by_order.entry(key).or_default().push(j);
    }

    let mut seen: HashSet<PairKey> = HashSet::new();
    let mut pairs = Vec::new();
    for j in judgments {
        if j.item_a == j.item_b {
            continue;
        }
        let key = j.pair_key();
        if !seen.insert(key.clone()) {
            continue;
        }
        let forward_order = (j.item_a.as_str(), j.item_b.as_str());
        let reverse_order = (j.item_b.as_str(), j.item_a.as_str());
        pairs.push(UniquePair {
            key,
            forward: j,
            reverse: last_by_order.get(&reverse_order).copied(),
            same_direction: by_order.get(&forward_order).cloned().unwrap_or_default(),
        });
    }
    pairs
}

/// Distinct item identifiers in first-seen order.
pub fn item_ids(judgments: &[Judgment]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ids = Vec::new();
    for j in judgments {
        for id in [j.item_a.as_str(), j.item_b.as_str()] {
            if seen.insert(id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

// =============================================================================
// Ground truth and feedback
// =============================================================================

/// Ground-truth score per item. Absent or null scores mean "unknown".
///
/// Ordered so serialized inputs hash the same across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth {
    scores: BTreeMap<String, Option<f64>>,
}

impl GroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: impl Into<String>, score: Option<f64>) {
        self.scores.insert(item.into(), score);
    }

    /// Known, finite score for `item`.
    pub fn score(&self, item: &str) -> Option<f64> {
        self.scores
            .get(item)
            .copied()
            .flatten()
            .filter(|s| s.is_finite())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for GroundTruth {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            scores: iter.into_iter().map(|(k, v)| (k.into(), Some(v))).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCriterion {
    #[serde(alias = "correct", deserialize_with = "deserialize_satisfied")]
    pub satisfied: bool,
}

/// Accepts `true`/`false` or the legacy `"yes"`/`"no"` strings.
fn deserialize_satisfied<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => s.trim().eq_ignore_ascii_case("yes"),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFeedback {
    #[serde(default, alias = "subcriteria")]
    pub sub_criteria: Vec<SubCriterion>,
}

impl ItemFeedback {
    pub fn from_flags(flags: &[bool]) -> Self {
        Self {
            sub_criteria: flags
                .iter()
                .map(|&satisfied| SubCriterion { satisfied })
                .collect(),
        }
    }

    pub fn satisfied_count(&self) -> usize {
        self.sub_criteria.iter().filter(|c| c.satisfied).count()
    }
}

/// Per-item sub-criteria, used only to break equal ground-truth scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feedback {
    items: BTreeMap<String, ItemFeedback>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: impl Into<String>, feedback: ItemFeedback) {
        self.items.insert(item.into(), feedback);
    }

    /// Satisfied sub-criteria count, `None` when the item has no feedback.
    pub fn satisfied_count(&self, item: &str) -> Option<usize> {
        self.items.get(item).map(ItemFeedback::satisfied_count)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Evaluation input
// =============================================================================

/// Everything one evaluation run needs, already parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub judgments: Vec<Judgment>,
    #[serde(default)]
    pub ground_truth: GroundTruth,
    #[serde(default)]
    pub feedback: Feedback,
}

impl EvaluationInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, InputError> {
        let input: Self = serde_json::from_str(raw)?;
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if let Some(j) = self.judgments.iter().find(|j| j.item_a == j.item_b) {
            return Err(InputError::SelfComparison {
                item: j.item_a.clone(),
            });
        }
        Ok(())
    }
}

/// Count of decisions by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTally {
    pub a_wins: usize,
    pub b_wins: usize,
    pub ties: usize,
}

impl DecisionTally {
    pub fn from_judgments(judgments: &[Judgment]) -> Self {
        let mut tally = Self::default();
        for j in judgments {
            match j.decision {
                Decision::A => tally.a_wins += 1,
                Decision::B => tally.b_wins += 1,
                Decision::Tie => tally.ties += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.a_wins + self.b_wins + self.ties
    }
}
