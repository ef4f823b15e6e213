use std::time::Duration;

use log::debug;

use crate::board::Position;
use crate::eval::{Evaluator, EVAL_TIMEOUT};
use crate::search::ordering::order_moves;
use crate::search::tree::{Score, SearchNode, MATE};

/// Alpha-beta searcher that records every visited node and every pruned
/// move. The node and prune counters live here so their lifetime is exactly
/// one top-level search invocation.
pub struct Searcher<'a> {
    evaluator: &'a Evaluator,
    eval_budget: Duration,
    nodes: u64,
    pruned: u64,
}

impl<'a> Searcher<'a> {
    pub fn new(evaluator: &'a Evaluator) -> Self {
        Self::with_eval_budget(evaluator, EVAL_TIMEOUT)
    }

    pub fn with_eval_budget(evaluator: &'a Evaluator, eval_budget: Duration) -> Self {
        Self { evaluator, eval_budget, nodes: 0, pruned: 0 }
    }

    /// All created nodes, pruned stubs included.
    pub fn nodes_explored(&self) -> u64 {
        self.nodes
    }

    /// One increment per cutoff event plus one per emitted stub, so a cutoff
    /// with k untried moves adds k + 1. Kept as the defined statistic.
    pub fn nodes_pruned(&self) -> u64 {
        self.pruned
    }

    /// Minimax value plus the recorded subtree. The position comes back
    /// exactly as it went in: every apply is undone on every return path.
    pub fn search(
        &mut self,
        pos: &mut Position,
        depth: u32,
        alpha: f64,
        beta: f64,
        maximizing: bool,
    ) -> (f64, SearchNode) {
        self.nodes += 1;
        let mut node = SearchNode::new(self.nodes, depth, maximizing, alpha, beta);

        if pos.is_checkmate() {
            // The side to move has just lost.
            let score = if maximizing { -MATE } else { MATE };
            node.is_leaf = true;
            node.is_terminal = true;
            node.eval_score = Some(Score::from_raw(score));
            node.value = Some(Score::from_raw(score));
            return (score, node);
        }

        if pos.is_stalemate() || pos.is_insufficient_material() || pos.can_claim_draw() {
            node.is_leaf = true;
            node.is_terminal = true;
            node.eval_score = Some(Score::from_raw(0.0));
            node.value = Some(Score::from_raw(0.0));
            return (0.0, node);
        }

        if depth == 0 {
            let score = match self.evaluator.score(pos, self.eval_budget) {
                Ok(s) => s,
                Err(e) => {
                    debug!("leaf evaluation degraded to 0: {e}");
                    0.0
                }
            };
            node.is_leaf = true;
            node.eval_score = Some(Score::from_raw(score));
            node.value = Some(Score::from_raw(score));
            return (score, node);
        }

        let ordered = order_moves(pos);
        let mut alpha = alpha;
        let mut beta = beta;
        let mut best = if maximizing { f64::NEG_INFINITY } else { f64::INFINITY };

        for (idx, m) in ordered.iter().enumerate() {
            let san = pos.san(m);
            let (child_val, mut child) = {
                let mut applied = pos.apply(m);
                self.search(applied.position(), depth - 1, alpha, beta, !maximizing)
            };
            child.move_san = Some(san);
            node.children.push(child);

            if maximizing {
                best = best.max(child_val);
                alpha = alpha.max(child_val);
            } else {
                best = best.min(child_val);
                beta = beta.min(child_val);
            }

            if beta <= alpha {
                self.pruned += 1;
                // Everything still untried at this ply becomes a stub
                // carrying the bounds in effect at the cutoff.
                for pruned_move in &ordered[idx + 1..] {
                    self.nodes += 1;
                    self.pruned += 1;
                    let mut stub =
                        SearchNode::new(self.nodes, depth - 1, !maximizing, alpha, beta);
                    stub.move_san = Some(pos.san(pruned_move));
                    stub.is_leaf = true;
                    stub.is_pruned = true;
                    node.children.push(stub);
                }
                break;
            }
        }

        node.value = Some(Score::from_raw(best));
        node.alpha = Score::from_raw(alpha);
        node.beta = Score::from_raw(beta);
        (best, node)
    }
}
