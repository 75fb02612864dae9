//! Playable board state.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};
use thiserror::Error;

use crate::fen::{FenError, FenFields};
use crate::mov::{parse_uci_move, PlayedMove};
use crate::{san, Color};

/// Errors from position setup or move application.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("invalid move notation: {0}")]
    InvalidNotation(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("ambiguous move: {0}")]
    AmbiguousMove(String),
}

/// A chess position that can be advanced with legal moves.
///
/// Every operation that fails leaves the board unchanged.
#[derive(Clone, Default)]
pub struct Board {
    pos: Chess,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board").field("fen", &self.fen()).finish()
    }
}

// Two boards are equal when they render the same FEN.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.fen() == other.fen()
    }
}

impl Eq for Board {}

impl Board {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::default()
    }

    /// Sets up a position from FEN.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Fen`] if the string is malformed or describes an
    /// impossible position (missing kings, pawns on the back rank, the side
    /// not to move in check, ...).
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let fields = FenFields::parse(fen)?;
        let setup: Fen = fields
            .to_fen()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| FenError::InvalidPosition(e.to_string()))?;
        let pos = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| FenError::InvalidPosition(e.to_string()))?;
        Ok(Self { pos })
    }

    /// Replays `moves` (long notation) from `fen`.
    ///
    /// This is the only way positions are reconstructed for navigation, so
    /// the result never depends on earlier board states.
    pub fn replay<'a>(
        fen: &str,
        moves: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, BoardError> {
        let mut board = Self::from_fen(fen)?;
        for mv in moves {
            board.play_uci(mv)?;
        }
        Ok(board)
    }

    /// Current position as a six-field FEN string.
    ///
    /// The en passant field names the target square only when a capture
    /// there is legal.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.pos.turn().into()
    }

    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    /// True when the side to move has no legal move.
    pub fn is_game_over(&self) -> bool {
        self.pos.legal_moves().is_empty()
    }

    /// Applies a move given in long notation.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidNotation`] for malformed input,
    /// [`BoardError::IllegalMove`] if the move is not legal here.
    pub fn play_uci(&mut self, uci: &str) -> Result<PlayedMove, BoardError> {
        let m = self.legal_uci(uci)?;
        Ok(self.apply(m))
    }

    /// Applies a move given in short algebraic notation.
    pub fn play_san(&mut self, text: &str) -> Result<PlayedMove, BoardError> {
        let parsed = san::parse(text)?;
        self.play_parsed_san(&parsed, text)
    }

    pub(crate) fn play_parsed_san(
        &mut self,
        parsed: &San,
        text: &str,
    ) -> Result<PlayedMove, BoardError> {
        let m = san::resolve(&self.pos, parsed, text)?;
        Ok(self.apply(m))
    }

    /// Short notation of a legal long-notation move, without playing it.
    pub fn san_of(&self, uci: &str) -> Result<String, BoardError> {
        let m = self.legal_uci(uci)?;
        Ok(san::render(&self.pos, m))
    }

    fn legal_uci(&self, uci: &str) -> Result<Move, BoardError> {
        parse_uci_move(uci)?
            .to_move(&self.pos)
            .map_err(|_| BoardError::IllegalMove(uci.to_string()))
    }

    fn apply(&mut self, m: Move) -> PlayedMove {
        let color = self.side_to_move();
        let uci: UciMove = m.clone().to_uci(CastlingMode::Standard);
        let san = san::render(&self.pos, m.clone());
        self.pos.play_unchecked(m);
        PlayedMove::new(&uci, san, color)
    }
}
