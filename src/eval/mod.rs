use std::time::Duration;

use shakmaty::{Color, Position as _, Role};
use thiserror::Error;

use crate::board::Position;

pub mod script;

pub use script::{BoardView, ScriptEval, DEFAULT_EVAL_SOURCE};

/// Wall-clock budget for one leaf evaluation.
pub const EVAL_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("compile error: {0}")]
    Compile(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("evaluation exceeded its {}ms budget", .0.as_millis())]
    Timeout(Duration),
}

/// Leaf scorer used by the search: either a compiled user script or the
/// built-in material count the driver falls back to when compilation fails.
pub enum Evaluator {
    Script(ScriptEval),
    Material,
}

impl Evaluator {
    /// Compile `source`, substituting the material evaluator (and returning
    /// the diagnostic) when the script is rejected.
    pub fn from_source(source: &str) -> (Self, Option<String>) {
        match ScriptEval::compile(source) {
            Ok(script) => (Evaluator::Script(script), None),
            Err(e) => (Evaluator::Material, Some(e.to_string())),
        }
    }

    pub fn score(&self, pos: &Position, budget: Duration) -> Result<f64, EvalError> {
        match self {
            Evaluator::Script(script) => script.execute(BoardView::new(pos), budget),
            Evaluator::Material => Ok(material_eval(pos)),
        }
    }
}

fn piece_value(role: Role) -> f64 {
    match role {
        Role::Pawn => 100.0,
        Role::Knight => 320.0,
        Role::Bishop => 330.0,
        Role::Rook => 500.0,
        Role::Queen => 900.0,
        Role::King => 0.0,
    }
}

fn count_piece(pos: &Position, color: Color, role: Role) -> f64 {
    let board = pos.inner().board();
    (board.by_color(color) & board.by_role(role)).count() as f64
}

/// Side-agnostic material in centipawns: positive means White has more.
pub fn material_eval(pos: &Position) -> f64 {
    let mut score = 0.0;
    for role in [Role::Pawn, Role::Knight, Role::Bishop, Role::Rook, Role::Queen] {
        score += (count_piece(pos, Color::White, role) - count_piece(pos, Color::Black, role))
            * piece_value(role);
    }
    score
}
