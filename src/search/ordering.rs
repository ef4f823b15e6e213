use shakmaty::Move;

use crate::board::Position;

/// Traversal order for one node: captures first, sorted by most-valuable
/// victim / least-valuable attacker over ordinal piece ranks, then quiet
/// checking moves, then the rest, the last two buckets in generation order.
/// This only steers pruning; it must never change the search value.
pub fn order_moves(pos: &mut Position) -> Vec<Move> {
    let mut captures: Vec<(Move, i32)> = Vec::new();
    let mut checks: Vec<Move> = Vec::new();
    let mut others: Vec<Move> = Vec::new();

    for m in pos.legal_moves() {
        if pos.is_capture(&m) {
            let score = pos.victim_rank(&m) * 10 - pos.attacker_rank(&m);
            captures.push((m, score));
        } else {
            let gives_check = {
                let applied = pos.apply(&m);
                applied.is_check()
            };
            if gives_check {
                checks.push(m);
            } else {
                others.push(m);
            }
        }
    }

    // Stable sort keeps generation order between equal capture scores.
    captures.sort_by_key(|&(_, score)| -score);

    let mut ordered = Vec::with_capacity(captures.len() + checks.len() + others.len());
    ordered.extend(captures.into_iter().map(|(m, _)| m));
    ordered.extend(checks);
    ordered.extend(others);
    ordered
}
