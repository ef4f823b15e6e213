use std::fmt;

use serde::{Serialize, Serializer};

/// Mate sentinel, large enough to dominate any material evaluation.
pub const MATE: f64 = 99999.0;

/// Bound/value representation stored on tree nodes and shown to clients:
/// magnitudes within 100 of the mate sentinel render as unbounded, the rest
/// round to one decimal place. Best-path matching compares this stored
/// representation exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    NegInf,
    Num(f64),
    Inf,
}

impl Score {
    pub fn from_raw(v: f64) -> Self {
        if v >= MATE - 100.0 {
            Score::Inf
        } else if v <= -(MATE - 100.0) {
            Score::NegInf
        } else {
            Score::Num((v * 10.0).round() / 10.0)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Inf => write!(f, "+inf"),
            Score::NegInf => write!(f, "-inf"),
            Score::Num(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Inf => serializer.serialize_str("+inf"),
            Score::NegInf => serializer.serialize_str("-inf"),
            Score::Num(v) => serializer.serialize_f64(*v),
        }
    }
}

/// One recorded node of the search tree. Children are stored in traversal
/// order; after a cutoff the real children are followed by one pruned stub
/// per untried move at that ply.
#[derive(Debug, Clone, Serialize)]
pub struct SearchNode {
    pub id: u64,
    #[serde(rename = "move")]
    pub move_san: Option<String>,
    pub depth: u32,
    pub is_maximizing: bool,
    pub alpha: Score,
    pub beta: Score,
    pub value: Option<Score>,
    pub is_leaf: bool,
    pub is_pruned: bool,
    pub is_terminal: bool,
    pub eval_score: Option<Score>,
    pub children: Vec<SearchNode>,
    pub is_best_path: bool,
}

impl SearchNode {
    pub(crate) fn new(id: u64, depth: u32, is_maximizing: bool, alpha: f64, beta: f64) -> Self {
        SearchNode {
            id,
            move_san: None,
            depth,
            is_maximizing,
            alpha: Score::from_raw(alpha),
            beta: Score::from_raw(beta),
            value: None,
            is_leaf: false,
            is_pruned: false,
            is_terminal: false,
            eval_score: None,
            children: Vec::new(),
            is_best_path: false,
        }
    }
}

/// Mark the principal line: the node itself, then the first non-pruned child
/// whose stored value matches, down to a childless node. Ties break by
/// insertion order, which is the traversal order the move orderer produced.
pub fn mark_best_path(node: &mut SearchNode) {
    node.is_best_path = true;
    let target = node.value;
    for child in &mut node.children {
        if child.is_pruned {
            continue;
        }
        if child.value == target {
            mark_best_path(child);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_band_renders_unbounded() {
        assert_eq!(Score::from_raw(MATE), Score::Inf);
        assert_eq!(Score::from_raw(MATE - 100.0), Score::Inf);
        assert_eq!(Score::from_raw(-MATE), Score::NegInf);
        assert_eq!(Score::from_raw(f64::INFINITY), Score::Inf);
        assert_eq!(Score::from_raw(f64::NEG_INFINITY), Score::NegInf);
        assert_eq!(Score::from_raw(MATE - 100.1), Score::Num(99898.9));
    }

    #[test]
    fn ordinary_values_round_to_one_decimal() {
        assert_eq!(Score::from_raw(1.24), Score::Num(1.2));
        assert_eq!(Score::from_raw(-0.06), Score::Num(-0.1));
        assert_eq!(Score::from_raw(320.0), Score::Num(320.0));
    }

    fn leaf(id: u64, value: f64, pruned: bool) -> SearchNode {
        let mut n = SearchNode::new(id, 0, false, f64::NEG_INFINITY, f64::INFINITY);
        n.is_leaf = true;
        n.is_pruned = pruned;
        if !pruned {
            n.value = Some(Score::from_raw(value));
        }
        n
    }

    #[test]
    fn best_path_skips_pruned_and_takes_first_match() {
        let mut root = SearchNode::new(1, 1, true, f64::NEG_INFINITY, f64::INFINITY);
        root.value = Some(Score::from_raw(5.0));
        root.children = vec![leaf(2, 3.0, false), leaf(3, 5.0, true), leaf(4, 5.0, false), leaf(5, 5.0, false)];

        mark_best_path(&mut root);

        assert!(root.is_best_path);
        assert!(!root.children[0].is_best_path);
        assert!(!root.children[1].is_best_path, "pruned child must be skipped");
        assert!(root.children[2].is_best_path, "first matching child wins");
        assert!(!root.children[3].is_best_path);
    }
}
