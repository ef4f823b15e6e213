use pretty_assertions::assert_eq;

use glassbot::board::Position;
use glassbot::eval::{material_eval, Evaluator};
use glassbot::search::alphabeta::Searcher;
use glassbot::search::tree::{mark_best_path, Score, SearchNode, MATE};

fn preorder(node: &SearchNode) -> Vec<&SearchNode> {
    let mut out = Vec::new();
    fn walk<'a>(n: &'a SearchNode, out: &mut Vec<&'a SearchNode>) {
        out.push(n);
        for c in &n.children {
            walk(c, out);
        }
    }
    walk(node, &mut out);
    out
}

fn search_material(fen: &str, depth: u32) -> (f64, SearchNode, u64, u64) {
    let mut pos = Position::from_fen(fen).expect("valid fen");
    let evaluator = Evaluator::Material;
    let mut searcher = Searcher::new(&evaluator);
    let maximizing = pos.white_to_move();
    let (value, tree) = searcher.search(&mut pos, depth, f64::NEG_INFINITY, f64::INFINITY, maximizing);
    (value, tree, searcher.nodes_explored(), searcher.nodes_pruned())
}

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const ITALIAN: &str = "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
const QUEEN_ATTACKED: &str = "rnb1kbnr/ppp1pppp/8/3q4/8/2N5/PPPP1PPP/R1BQKBNR w KQkq - 2 3";

#[test]
fn node_ids_are_unique_and_strictly_increasing() {
    let (_, tree, explored, _) = search_material(ITALIAN, 3);
    let nodes = preorder(&tree);
    assert_eq!(tree.id, 1, "root is the first node created");
    assert_eq!(nodes.len() as u64, explored, "every created node is in the tree");
    for pair in nodes.windows(2) {
        assert!(
            pair[1].id > pair[0].id,
            "creation order must be strictly increasing: {} then {}",
            pair[0].id,
            pair[1].id
        );
    }
}

#[test]
fn stubs_are_valueless_childless_leaves() {
    let (_, tree, _, _) = search_material(ITALIAN, 3);
    let mut saw_stub = false;
    for n in preorder(&tree) {
        if n.is_pruned {
            saw_stub = true;
            assert!(n.is_leaf);
            assert!(!n.is_terminal);
            assert!(n.children.is_empty());
            assert!(n.value.is_none());
            assert!(n.eval_score.is_none());
            assert!(n.move_san.is_some(), "a stub records the move it skipped");
        }
    }
    assert!(saw_stub, "depth-3 search of a tactical position should prune");
}

#[test]
fn startpos_depth2_prune_accounting_is_exact() {
    // From the start position every white move leaves black 20 quiet
    // replies scoring 0, so the first root child searches all 20 leaves and
    // each of the other 19 cuts off after one leaf, stubbing the remaining
    // 19 replies: a cutoff with k untried moves must add k + 1 to the
    // pruned counter.
    let (value, tree, explored, pruned) = search_material(STARTPOS, 2);
    assert_eq!(value, 0.0);
    assert_eq!(explored, 1 + 20 + 20 + 19 * 20);
    assert_eq!(pruned, 19 * 20);

    let nodes = preorder(&tree);
    let stubs = nodes.iter().filter(|n| n.is_pruned).count() as u64;
    let cutoff_parents = nodes
        .iter()
        .filter(|n| n.children.iter().any(|c| c.is_pruned))
        .count() as u64;
    assert_eq!(stubs, 19 * 19);
    assert_eq!(cutoff_parents, 19);
    assert_eq!(pruned, stubs + cutoff_parents);
}

#[test]
fn pruning_never_changes_the_minimax_value() {
    fn minimax(pos: &mut Position, depth: u32, maximizing: bool) -> f64 {
        if pos.is_checkmate() {
            return if maximizing { -MATE } else { MATE };
        }
        if pos.is_stalemate() || pos.is_insufficient_material() || pos.can_claim_draw() {
            return 0.0;
        }
        if depth == 0 {
            return material_eval(pos);
        }
        let mut best = if maximizing { f64::NEG_INFINITY } else { f64::INFINITY };
        for m in pos.legal_moves() {
            let mut applied = pos.apply(&m);
            let v = minimax(applied.position(), depth - 1, !maximizing);
            best = if maximizing { best.max(v) } else { best.min(v) };
        }
        best
    }

    for fen in [STARTPOS, ITALIAN, QUEEN_ATTACKED] {
        for depth in [1, 2, 3] {
            let mut pos = Position::from_fen(fen).expect("valid fen");
            let maximizing = pos.white_to_move();
            let oracle = minimax(&mut pos, depth, maximizing);
            let (value, _, _, _) = search_material(fen, depth);
            assert_eq!(
                value, oracle,
                "alpha-beta diverged from brute force at depth {depth} on {fen}"
            );
        }
    }
}

#[test]
fn best_path_is_a_value_preserving_chain_to_a_leaf() {
    let (_, mut tree, _, _) = search_material(QUEEN_ATTACKED, 3);
    mark_best_path(&mut tree);
    assert!(tree.is_best_path, "the root is always marked");

    let mut node = &tree;
    loop {
        let marked: Vec<&SearchNode> =
            node.children.iter().filter(|c| c.is_best_path).collect();
        if marked.is_empty() {
            assert!(node.children.is_empty(), "the chain must end at a true leaf");
            break;
        }
        assert_eq!(marked.len(), 1, "exactly one child per step is on the line");
        let next = marked[0];
        assert!(!next.is_pruned);
        assert_eq!(next.value, node.value, "the line preserves the backed-up value");
        node = next;
    }
}

#[test]
fn internal_values_fold_their_real_children() {
    let (_, tree, _, _) = search_material(ITALIAN, 2);
    for n in preorder(&tree) {
        if n.is_leaf || n.children.is_empty() {
            continue;
        }
        let folded = n
            .children
            .iter()
            .filter(|c| !c.is_pruned)
            .filter_map(|c| match c.value {
                Some(Score::Num(v)) => Some(Score::Num(v)),
                other => other,
            })
            .reduce(|a, b| pick(n.is_maximizing, a, b))
            .expect("internal nodes have at least one real child");
        assert_eq!(n.value, Some(folded), "node {} folds its children", n.id);
    }

    fn rank(s: Score) -> f64 {
        match s {
            Score::NegInf => f64::NEG_INFINITY,
            Score::Num(v) => v,
            Score::Inf => f64::INFINITY,
        }
    }

    fn pick(maximizing: bool, a: Score, b: Score) -> Score {
        let better = if maximizing { rank(b) > rank(a) } else { rank(b) < rank(a) };
        if better {
            b
        } else {
            a
        }
    }
}
