use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Position as _, Rank, Square};

/// Mutable game state plus an undo stack, so the search can walk the move
/// tree with strict make/unmake discipline. shakmaty has no `undo_move`, so
/// unmake restores the pre-move state saved by `make`.
#[derive(Clone, Debug)]
pub struct Position {
    board: Chess,
    stack: Vec<Chess>,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: Chess::default(), stack: Vec::with_capacity(16) }
    }

    pub fn from_fen(fen: &str) -> Result<Self, String> {
        let setup: Fen = fen.parse().map_err(|e| format!("FEN error: {e}"))?;
        let board = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| format!("FEN error: {e}"))?;
        Ok(Self { board, stack: Vec::with_capacity(16) })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.board.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.legal_moves().into_iter().collect()
    }

    /// Apply `m` and get a guard that undoes it when dropped, whatever the
    /// exit path.
    pub fn apply(&mut self, m: &Move) -> Applied<'_> {
        self.make(m);
        Applied { pos: self }
    }

    fn make(&mut self, m: &Move) {
        self.stack.push(self.board.clone());
        self.board.play_unchecked(m);
    }

    fn unmake(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.board = prev;
        }
    }

    pub fn is_check(&self) -> bool {
        self.board.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.board.is_insufficient_material()
    }

    /// Fifty-move claims only; repetition claims need game history the
    /// caller owns.
    pub fn can_claim_draw(&self) -> bool {
        self.board.halfmoves() >= 100
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate()
            || self.is_stalemate()
            || self.is_insufficient_material()
            || self.can_claim_draw()
    }

    pub fn white_to_move(&self) -> bool {
        self.board.turn().is_white()
    }

    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    pub fn is_capture(&self, m: &Move) -> bool {
        m.is_capture()
    }

    /// Ordinal rank (pawn=1 .. king=6) of the piece on the destination
    /// square; 0 when that square is empty, which an en passant victim is.
    pub fn victim_rank(&self, m: &Move) -> i32 {
        self.board.board().role_at(m.to()).map(|r| r as i32).unwrap_or(0)
    }

    pub fn attacker_rank(&self, m: &Move) -> i32 {
        m.role() as i32
    }

    pub fn san(&self, m: &Move) -> String {
        SanPlus::from_move(self.board.clone(), m).to_string()
    }

    pub fn parse_san(&self, san: &str) -> Option<Move> {
        let parsed: SanPlus = san.parse().ok()?;
        parsed.san.to_move(&self.board).ok()
    }

    pub fn uci(&self, m: &Move) -> String {
        m.to_uci(CastlingMode::Standard).to_string()
    }

    pub fn legal_moves_uci(&self) -> Vec<String> {
        self.legal_moves().iter().map(|m| self.uci(m)).collect()
    }

    /// Status string for game-page payloads; checkmate names the mated side.
    pub fn game_status(&self) -> &'static str {
        if self.is_checkmate() {
            if self.white_to_move() {
                "checkmate_white"
            } else {
                "checkmate_black"
            }
        } else if self.is_stalemate() {
            "stalemate"
        } else if self.is_insufficient_material() || self.can_claim_draw() {
            "draw"
        } else {
            "playing"
        }
    }

    /// 8x8 piece chars with rank 8 first; uppercase white, lowercase black.
    pub fn board_rows(&self) -> Vec<Vec<Option<char>>> {
        let board = self.board.board();
        let mut rows = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let mut row = Vec::with_capacity(8);
            for file in 0..8 {
                let sq = Square::from_coords(File::new(file), Rank::new(rank));
                row.push(board.piece_at(sq).map(|p| p.char()));
            }
            rows.push(row);
        }
        rows
    }

    pub fn inner(&self) -> &Chess {
        &self.board
    }
}

/// Scope guard pairing one `make` with exactly one `unmake`.
pub struct Applied<'a> {
    pos: &'a mut Position,
}

impl Applied<'_> {
    pub fn position(&mut self) -> &mut Position {
        self.pos
    }
}

impl std::ops::Deref for Applied<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.pos
    }
}

impl Drop for Applied<'_> {
    fn drop(&mut self) {
        self.pos.unmake();
    }
}
