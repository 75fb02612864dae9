//! Long move notation (`e2e4`, `e7e8q`).

use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;
use shakmaty::Role;

use crate::{BoardError, Color};

/// A move that has been applied to a [`crate::Board`], in both notations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    /// Long notation, origin + destination (+ promotion).
    pub uci: String,
    /// Short algebraic notation for display.
    pub san: String,
    /// Origin square name, e.g. `e2`.
    pub from: String,
    /// Destination square name, e.g. `e4`.
    pub to: String,
    /// Side that played the move.
    pub color: Color,
}

impl PlayedMove {
    pub(crate) fn new(uci: &UciMove, san: String, color: Color) -> Self {
        let (from, to) = match uci {
            UciMove::Normal { from, to, .. } => (from.to_string(), to.to_string()),
            UciMove::Put { to, .. } => (String::new(), to.to_string()),
            UciMove::Null => (String::new(), String::new()),
        };
        Self {
            uci: uci.to_string(),
            san,
            from,
            to,
            color,
        }
    }
}

/// Parses long notation without checking legality.
///
/// Case-insensitive. Null moves (`0000`), drops and placeholders such as
/// `(none)` are rejected, as are king promotions and zero-length moves.
pub(crate) fn parse_uci_move(s: &str) -> Result<UciMove, BoardError> {
    let invalid = || BoardError::InvalidNotation(s.to_string());
    let parsed: UciMove = s
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| invalid())?;

    match parsed {
        UciMove::Normal {
            from,
            to,
            promotion,
        } if from != to
            && matches!(
                promotion,
                None | Some(Role::Knight | Role::Bishop | Role::Rook | Role::Queen)
            ) =>
        {
            Ok(parsed)
        }
        _ => Err(invalid()),
    }
}
