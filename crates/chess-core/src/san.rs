//! Short algebraic notation over shakmaty's SAN type.

use shakmaty::san::{San, SanError};
use shakmaty::{Chess, Move, Position};

use crate::BoardError;

/// Reads a SAN token, tolerating check marks, annotation glyphs and
/// zero-style castling (`0-0`).
pub(crate) fn parse(text: &str) -> Result<San, BoardError> {
    let cleaned = text
        .trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O");
    cleaned
        .parse()
        .map_err(|_| BoardError::InvalidNotation(text.to_string()))
}

/// Resolves a parsed token against the legal moves of `pos`.
pub(crate) fn resolve(pos: &Chess, san: &San, text: &str) -> Result<Move, BoardError> {
    san.to_move(pos).map_err(|e| match e {
        SanError::AmbiguousSan => BoardError::AmbiguousMove(text.to_string()),
        _ => BoardError::IllegalMove(text.to_string()),
    })
}

/// SAN of a legal move, with `+` or `#` appended.
pub(crate) fn render(pos: &Chess, m: Move) -> String {
    let mut san = San::from_move(pos, m.clone()).to_string();
    let mut after = pos.clone();
    after.play_unchecked(m);
    if after.is_checkmate() {
        san.push('#');
    } else if after.is_check() {
        san.push('+');
    }
    san
}
