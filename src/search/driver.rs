use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::board::Position;
use crate::eval::{BoardView, Evaluator, ScriptEval, EVAL_TIMEOUT};
use crate::search::alphabeta::Searcher;
use crate::search::tree::{mark_best_path, SearchNode};

#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    pub nodes_explored: u64,
    pub nodes_pruned: u64,
    pub search_time_ms: u64,
    pub max_depth: u32,
}

/// Result of one full search: chosen move, annotated tree, the one-shot
/// compile diagnostic if the script was rejected, and aggregate stats.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub ai_move: Option<String>,
    pub ai_move_san: Option<String>,
    pub tree: SearchNode,
    pub eval_error: Option<String>,
    pub stats: SearchStats,
}

/// Serving-layer mirror of `SearchReport` where everything is optional: a
/// position that is already terminal yields no move, tree, or stats.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub ai_move: Option<String>,
    pub ai_move_san: Option<String>,
    pub tree: Option<SearchNode>,
    pub eval_error: Option<String>,
    pub stats: Option<SearchStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub score: Option<f64>,
    pub error: Option<String>,
}

/// Run the search and pick a move. Assumes at least one legal move exists;
/// callers gate terminal positions through [`analyze`].
pub fn find_best_move(pos: &mut Position, eval_source: &str, depth: u32) -> SearchReport {
    let (evaluator, eval_error) = Evaluator::from_source(eval_source);
    if let Some(err) = &eval_error {
        debug!("evaluation script rejected, falling back to material count: {err}");
    }

    let maximizing = pos.white_to_move();
    let mut searcher = Searcher::new(&evaluator);
    let start = Instant::now();
    let (_, mut tree) = searcher.search(pos, depth, f64::NEG_INFINITY, f64::INFINITY, maximizing);
    let search_time_ms = start.elapsed().as_millis() as u64;

    mark_best_path(&mut tree);

    let mut ai_move_san = tree
        .children
        .iter()
        .find(|c| c.is_best_path && !c.is_pruned)
        .and_then(|c| c.move_san.clone());

    // The SAN stored in the tree is re-resolved against the live position; a
    // failed round trip falls through to the first legal move.
    let mut ai_move = None;
    if let Some(san) = &ai_move_san {
        match pos.parse_san(san) {
            Some(m) => ai_move = Some(pos.uci(&m)),
            None => ai_move_san = None,
        }
    }

    if ai_move.is_none() {
        if let Some(m) = pos.legal_moves().into_iter().next() {
            ai_move = Some(pos.uci(&m));
            ai_move_san = Some(pos.san(&m));
        }
    }

    let stats = SearchStats {
        nodes_explored: searcher.nodes_explored(),
        nodes_pruned: searcher.nodes_pruned(),
        search_time_ms,
        max_depth: depth,
    };
    info!(
        "search depth {} explored {} pruned {} in {}ms",
        depth, stats.nodes_explored, stats.nodes_pruned, search_time_ms
    );

    SearchReport { ai_move, ai_move_san, tree, eval_error, stats }
}

/// Serving-layer entry point: refuses to search a finished game.
pub fn analyze(pos: &mut Position, eval_source: &str, depth: u32) -> AnalysisResponse {
    if pos.is_game_over() {
        return AnalysisResponse {
            ai_move: None,
            ai_move_san: None,
            tree: None,
            eval_error: None,
            stats: None,
        };
    }
    let report = find_best_move(pos, eval_source, depth);
    AnalysisResponse {
        ai_move: report.ai_move,
        ai_move_san: report.ai_move_san,
        tree: Some(report.tree),
        eval_error: report.eval_error,
        stats: Some(report.stats),
    }
}

/// Compile and run a script exactly once against `pos`, with no tree
/// recording. Same compile/execute contracts as the search path.
pub fn validate_eval(eval_source: &str, pos: &Position) -> ValidationReport {
    match ScriptEval::compile(eval_source) {
        Err(e) => ValidationReport { valid: false, score: None, error: Some(e.to_string()) },
        Ok(script) => match script.execute(BoardView::new(pos), EVAL_TIMEOUT) {
            Ok(score) => ValidationReport { valid: true, score: Some(score), error: None },
            Err(e) => ValidationReport { valid: false, score: None, error: Some(e.to_string()) },
        },
    }
}
