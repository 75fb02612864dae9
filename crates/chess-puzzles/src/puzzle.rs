//! Puzzle definitions.

use chess_core::{Board, BoardError, Color};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::PuzzleStatus;

/// Errors from puzzle definitions and sessions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("puzzle {id}: invalid starting position: {source}")]
    InvalidPosition {
        id: String,
        #[source]
        source: BoardError,
    },

    #[error("puzzle {id}: empty solution")]
    EmptySolution { id: String },

    /// The line must end on the solver's move.
    #[error("puzzle {id}: solution of {len} moves ends with an opponent move")]
    EndsOnReply { id: String, len: usize },

    /// A solution entry is not legal where it is played.
    #[error("puzzle {id}: solution move {index} ({mv}) is illegal: {source}")]
    IllegalSolutionMove {
        id: String,
        index: usize,
        mv: String,
        #[source]
        source: BoardError,
    },

    #[error("operation needs a {expected} puzzle, this one is {actual}")]
    WrongStatus {
        expected: PuzzleStatus,
        actual: PuzzleStatus,
    },

    #[error("waiting for the opponent's reply")]
    AwaitingReply,

    #[error("no solution move left")]
    LineFinished,
}

/// A puzzle: a position and the line that solves it.
///
/// `solution` alternates player and opponent moves, player first, all in
/// long notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub rating: u32,
    pub theme: String,
    pub fen: String,
    pub solution: Vec<String>,
}

impl PuzzleDefinition {
    /// Side the solver plays.
    pub fn player_color(&self) -> Color {
        Color::from_fen(&self.fen)
    }

    /// Whether solution entry `index` is the solver's move.
    pub fn is_player_move(&self, index: usize) -> bool {
        index % 2 == 0
    }

    /// Replays the whole solution line from the starting position.
    ///
    /// # Errors
    ///
    /// Reports the first problem: a bad FEN, an empty line, a line that
    /// ends on an opponent move, or the first entry that is not legal in
    /// the position it is played from.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        let mut board = Board::from_fen(&self.fen).map_err(|source| PuzzleError::InvalidPosition {
            id: self.id.clone(),
            source,
        })?;
        let Some(last) = self.solution.len().checked_sub(1) else {
            return Err(PuzzleError::EmptySolution {
                id: self.id.clone(),
            });
        };
        if !self.is_player_move(last) {
            return Err(PuzzleError::EndsOnReply {
                id: self.id.clone(),
                len: self.solution.len(),
            });
        }
        for (index, mv) in self.solution.iter().enumerate() {
            board
                .play_uci(mv)
                .map_err(|source| PuzzleError::IllegalSolutionMove {
                    id: self.id.clone(),
                    index,
                    mv: mv.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arabian() -> PuzzleDefinition {
        PuzzleDefinition {
            id: "7".to_string(),
            title: "Arabian Mate".to_string(),
            description: String::new(),
            rating: 1100,
            theme: "Endgame Tactic".to_string(),
            fen: "7k/1R6/5N2/8/8/8/8/7K w - - 0 1".to_string(),
            solution: vec!["b7h7".to_string()],
        }
    }

    #[test]
    fn valid_line() {
        let puzzle = arabian();
        assert_eq!(puzzle.validate(), Ok(()));
        assert_eq!(puzzle.player_color(), Color::White);
        assert!(puzzle.is_player_move(0));
        assert!(!puzzle.is_player_move(1));
    }

    #[test]
    fn line_must_end_on_solver_move() {
        let mut puzzle = arabian();
        puzzle.id = "opera".to_string();
        puzzle.fen = "4kb1r/p2n1ppp/4q3/4p1B1/4P3/1Q6/PPP2PPP/2KR4 w k - 1 22".to_string();
        puzzle.solution = vec!["b3b8".to_string(), "d7b8".to_string()];
        assert_eq!(
            puzzle.validate(),
            Err(PuzzleError::EndsOnReply {
                id: "opera".to_string(),
                len: 2
            })
        );

        puzzle.solution.push("d1d8".to_string());
        assert_eq!(puzzle.validate(), Ok(()));
    }

    #[test]
    fn reports_first_illegal_entry() {
        let mut puzzle = arabian();
        puzzle.solution = vec!["b7h7".to_string(), "h8g8".to_string(), "h7h8".to_string()];
        // Black is mated after b7h7, so there is no reply.
        assert!(matches!(
            puzzle.validate(),
            Err(PuzzleError::IllegalSolutionMove { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty_line_and_bad_fen() {
        let mut puzzle = arabian();
        puzzle.solution.clear();
        assert!(matches!(
            puzzle.validate(),
            Err(PuzzleError::EmptySolution { .. })
        ));

        let mut puzzle = arabian();
        puzzle.fen = "8/8/8/8 w - - 0 1".to_string();
        assert!(matches!(
            puzzle.validate(),
            Err(PuzzleError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn description_is_optional_in_json() {
        let json = r#"{"id":"x","title":"T","rating":900,"theme":"Mate",
            "fen":"7k/1R6/5N2/8/8/8/8/7K w - - 0 1","solution":["b7h7"]}"#;
        let puzzle: PuzzleDefinition = serde_json::from_str(json).unwrap();
        assert!(puzzle.description.is_empty());
    }
}
