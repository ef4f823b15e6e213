use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, Scope, AST};
use shakmaty::{Chess, Position as _};

use crate::board::Position;
use crate::eval::EvalError;

/// Material-count script shipped as the user-facing starting point. The
/// driver's compile-failure fallback is the native material evaluator, not
/// this source.
pub const DEFAULT_EVAL_SOURCE: &str = r#"// Material count: positive when White is ahead.
//
// The board argument exposes:
//   board.pieces()          array of #{ square, kind, white } maps
//   board.is_check()        board.is_checkmate()
//   board.white_to_move()   board.legal_move_count()
//   rank_of(square), file_of(square)
fn evaluate(board) {
    let values = #{ pawn: 100.0, knight: 320.0, bishop: 330.0, rook: 500.0, queen: 900.0, king: 0.0 };
    let score = 0.0;
    for p in board.pieces() {
        let v = values[p.kind];
        if p.white { score += v; } else { score -= v; }
    }
    score
}
"#;

/// Snapshot handed to evaluation scripts. Owns its own copy of the board so
/// an abandoned worker never touches the position the search is mutating.
#[derive(Clone)]
pub struct BoardView {
    board: Chess,
}

impl BoardView {
    pub fn new(pos: &Position) -> Self {
        Self { board: pos.inner().clone() }
    }

    fn pieces(&mut self) -> rhai::Array {
        let board = self.board.board();
        let mut out = rhai::Array::new();
        for sq in board.occupied() {
            if let Some(piece) = board.piece_at(sq) {
                let mut entry = rhai::Map::new();
                entry.insert("square".into(), Dynamic::from(u32::from(sq) as i64));
                entry.insert("kind".into(), role_name(piece.role).into());
                entry.insert("white".into(), Dynamic::from(piece.color.is_white()));
                out.push(entry.into());
            }
        }
        out
    }

    fn is_check(&mut self) -> bool {
        self.board.is_check()
    }

    fn is_checkmate(&mut self) -> bool {
        self.board.is_checkmate()
    }

    fn white_to_move(&mut self) -> bool {
        self.board.turn().is_white()
    }

    fn legal_move_count(&mut self) -> i64 {
        self.board.legal_moves().len() as i64
    }
}

fn role_name(role: shakmaty::Role) -> &'static str {
    match role {
        shakmaty::Role::Pawn => "pawn",
        shakmaty::Role::Knight => "knight",
        shakmaty::Role::Bishop => "bishop",
        shakmaty::Role::Rook => "rook",
        shakmaty::Role::Queen => "queen",
        shakmaty::Role::King => "king",
    }
}

/// Restricted engine: stock arithmetic/collection built-ins plus the board
/// query API. No module resolver, so `import` always fails; no filesystem,
/// network, or process functions are ever registered.
fn build_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_module_resolver(DummyModuleResolver::new());
    engine.register_type_with_name::<BoardView>("Board");
    engine.register_fn("pieces", BoardView::pieces);
    engine.register_fn("is_check", BoardView::is_check);
    engine.register_fn("is_checkmate", BoardView::is_checkmate);
    engine.register_fn("white_to_move", BoardView::white_to_move);
    engine.register_fn("legal_move_count", BoardView::legal_move_count);
    engine.register_fn("rank_of", |sq: i64| sq / 8);
    engine.register_fn("file_of", |sq: i64| sq % 8);
    engine
}

/// A compiled user evaluation function. Compiled once per search, invoked
/// once per leaf.
#[derive(Debug)]
pub struct ScriptEval {
    ast: Arc<AST>,
}

impl ScriptEval {
    pub fn compile(source: &str) -> Result<Self, EvalError> {
        let engine = build_engine();
        let ast = engine
            .compile(source)
            .map_err(|e| EvalError::Compile(e.to_string()))?;

        let mut arity = None;
        for f in ast.iter_functions() {
            if f.name == "evaluate" {
                arity = Some(f.params.len());
                if f.params.len() == 1 {
                    break;
                }
            }
        }
        match arity {
            None => Err(EvalError::Compile(
                "no `evaluate` function defined in the script".into(),
            )),
            Some(n) if n != 1 => Err(EvalError::Compile(format!(
                "`evaluate` must take exactly one argument, found {n}"
            ))),
            Some(_) => Ok(Self { ast: Arc::new(ast) }),
        }
    }

    /// Run `evaluate(view)` on a detached worker, waiting at most `budget`.
    /// On timeout the worker is abandoned: it may run to completion in the
    /// background against its private snapshot, and its result is discarded.
    pub fn execute(&self, view: BoardView, budget: Duration) -> Result<f64, EvalError> {
        let (tx, rx) = mpsc::channel();
        let ast = Arc::clone(&self.ast);
        thread::spawn(move || {
            let engine = build_engine();
            let mut scope = Scope::new();
            let result = engine
                .call_fn::<Dynamic>(&mut scope, &ast, "evaluate", (view,))
                .map_err(|e| e.to_string());
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(result);
        });

        match rx.recv_timeout(budget) {
            Ok(Ok(value)) => coerce_score(value),
            Ok(Err(message)) => Err(EvalError::Runtime(message)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(EvalError::Timeout(budget)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EvalError::Runtime(
                "evaluation worker exited without a result".into(),
            )),
        }
    }
}

fn coerce_score(value: Dynamic) -> Result<f64, EvalError> {
    let type_name = value.type_name();
    if let Some(f) = value.clone().try_cast::<f64>() {
        return Ok(f);
    }
    if let Some(i) = value.try_cast::<i64>() {
        return Ok(i as f64);
    }
    Err(EvalError::Runtime(format!(
        "evaluate returned {type_name}, expected a number"
    )))
}
