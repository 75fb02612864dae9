//! The finished analysis of one game.
//!
//! A [`GameReview`] is built once by the analyzer (or loaded from JSON) and
//! never changes afterwards. Construction checks that the evaluation history,
//! the best-move list and the move records line up, and derives both sides'
//! statistics from the records.

use chess_core::{Board, BoardError, Color, PgnGame, PlayedMove};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quality::{classify, fold, Classification, ClassificationCounts, SideStats};

/// Reasons a review record is rejected.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A stored classification disagrees with the scores around it.
    #[error("move {ply} is classified {stored} but its scores give {derived}")]
    Classification {
        ply: usize,
        stored: Classification,
        derived: Classification,
    },
    #[error("move {ply} ({uci}) does not replay: {source}")]
    Replay {
        ply: usize,
        uci: String,
        #[source]
        source: BoardError,
    },
    #[error("invalid initial position: {0}")]
    InitialPosition(#[source] BoardError),
    #[error("review JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One played move and how it was judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub san: String,
    pub uci: String,
    pub from: String,
    pub to: String,
    /// Side that played the move.
    pub side: Color,
    pub classification: Classification,
    /// Per-move accuracy, 0-100.
    pub accuracy: f64,
}

impl MoveRecord {
    pub fn new(played: &PlayedMove, classification: Classification, accuracy: f64) -> Self {
        Self {
            san: played.san.clone(),
            uci: played.uci.clone(),
            from: played.from.clone(),
            to: played.to.clone(),
            side: played.color,
            classification,
            accuracy,
        }
    }
}

/// Player names and result from the PGN header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,
}

impl GameInfo {
    pub fn from_pgn(game: &PgnGame) -> Self {
        let tag = |name| {
            game.tag(name)
                .filter(|v| !v.is_empty() && *v != "?")
                .map(str::to_string)
        };
        Self {
            white: tag("White"),
            black: tag("Black"),
            result: tag("Result").filter(|r| r != "*"),
        }
    }
}

/// Immutable result of analyzing a whole game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReview {
    info: GameInfo,
    initial_fen: String,
    depth: u32,
    white_stats: SideStats,
    black_stats: SideStats,
    /// Index 0 is the initial position, index i the position after move i.
    evaluation_history: Vec<i32>,
    moves: Vec<MoveRecord>,
    /// Entry i is the engine's choice in the position before move i.
    best_moves: Vec<Option<String>>,
}

/// Serialized form; statistics are recomputed on load.
#[derive(Deserialize)]
struct RawReview {
    #[serde(default)]
    info: GameInfo,
    initial_fen: String,
    depth: u32,
    evaluation_history: Vec<i32>,
    moves: Vec<MoveRecord>,
    best_moves: Vec<Option<String>>,
}

impl GameReview {
    /// Assembles and checks a review.
    ///
    /// # Errors
    ///
    /// Fails when the history or best-move list is not one longer than the
    /// move list, when a classification does not follow from the stored
    /// scores, or when the moves do not replay from `initial_fen`.
    pub fn new(
        info: GameInfo,
        initial_fen: String,
        depth: u32,
        evaluation_history: Vec<i32>,
        moves: Vec<MoveRecord>,
        best_moves: Vec<Option<String>>,
    ) -> Result<Self, ReviewError> {
        check_len("evaluation history", moves.len() + 1, evaluation_history.len())?;
        check_len("best move list", moves.len() + 1, best_moves.len())?;

        let mut board = Board::from_fen(&initial_fen).map_err(ReviewError::InitialPosition)?;
        for (ply, record) in moves.iter().enumerate() {
            let was_best = best_moves[ply].as_deref() == Some(record.uci.as_str());
            let derived = classify(
                evaluation_history[ply],
                evaluation_history[ply + 1],
                record.side,
                was_best,
            );
            if derived != record.classification {
                return Err(ReviewError::Classification {
                    ply,
                    stored: record.classification,
                    derived,
                });
            }
            if board.side_to_move() != record.side {
                return Err(ReviewError::Replay {
                    ply,
                    uci: record.uci.clone(),
                    source: BoardError::IllegalMove(format!("{} to move", board.side_to_move())),
                });
            }
            board
                .play_uci(&record.uci)
                .map_err(|source| ReviewError::Replay {
                    ply,
                    uci: record.uci.clone(),
                    source,
                })?;
        }

        let white_stats = side_stats(&moves, Color::White);
        let black_stats = side_stats(&moves, Color::Black);

        Ok(Self {
            info,
            initial_fen,
            depth,
            white_stats,
            black_stats,
            evaluation_history,
            moves,
            best_moves,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ReviewError> {
        let raw: RawReview = serde_json::from_str(json)?;
        Self::new(
            raw.info,
            raw.initial_fen,
            raw.depth,
            raw.evaluation_history,
            raw.moves,
            raw.best_moves,
        )
    }

    pub fn to_json(&self) -> Result<String, ReviewError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    /// Search depth every position was analyzed to.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn stats(&self, side: Color) -> &SideStats {
        match side {
            Color::White => &self.white_stats,
            Color::Black => &self.black_stats,
        }
    }

    pub fn white_stats(&self) -> &SideStats {
        &self.white_stats
    }

    pub fn black_stats(&self) -> &SideStats {
        &self.black_stats
    }

    pub fn evaluation_history(&self) -> &[i32] {
        &self.evaluation_history
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn best_moves(&self) -> &[Option<String>] {
        &self.best_moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ReviewError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ReviewError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn side_stats(moves: &[MoveRecord], side: Color) -> SideStats {
    let mine = moves.iter().filter(|m| m.side == side);
    let accuracies: Vec<f64> = mine.clone().map(|m| m.accuracy).collect();
    let counts: ClassificationCounts = mine.map(|m| m.classification).collect();
    fold(&accuracies, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::judge_move;
    use chess_core::STARTPOS;
    use proptest::prelude::*;

    const RUY_LOPEZ: [&str; 8] = [
        "e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6",
    ];

    /// Two-move review with consistent classifications.
    fn sample() -> (Vec<i32>, Vec<MoveRecord>, Vec<Option<String>>) {
        let history = vec![20, 30, 500];
        let best = vec![Some("e2e4".to_string()), Some("e7e5".to_string()), None];
        let mut board = Board::startpos();
        let mut records = Vec::new();
        for (ply, uci) in ["e2e4", "f7f6"].iter().enumerate() {
            let played = board.play_uci(uci).unwrap();
            let was_best = best[ply].as_deref() == Some(*uci);
            let j = judge_move(history[ply], history[ply + 1], played.color, was_best);
            records.push(MoveRecord::new(&played, j.classification, j.accuracy));
        }
        (history, records, best)
    }

    #[test]
    fn builds_stats_per_side() {
        let (history, moves, best) = sample();
        let review = GameReview::new(
            GameInfo::default(),
            STARTPOS.to_string(),
            13,
            history,
            moves,
            best,
        )
        .unwrap();

        assert_eq!(review.len(), 2);
        assert_eq!(review.moves()[0].classification, Classification::Best);
        assert_eq!(review.white_stats().counts.total(), 1);
        assert_eq!(review.black_stats().counts.total(), 1);
        assert_eq!(review.black_stats().counts.get(Classification::Blunder), 1);
        assert!(review.black_stats().accuracy < review.white_stats().accuracy);
    }

    #[test]
    fn rejects_short_history() {
        let (mut history, moves, best) = sample();
        history.pop();
        let err = GameReview::new(
            GameInfo::default(),
            STARTPOS.to_string(),
            13,
            history,
            moves,
            best,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::LengthMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn rejects_inconsistent_classification() {
        let (history, mut moves, best) = sample();
        moves[1].classification = Classification::Good;
        let err = GameReview::new(
            GameInfo::default(),
            STARTPOS.to_string(),
            13,
            history,
            moves,
            best,
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Classification { ply: 1, .. }));
    }

    #[test]
    fn json_round_trip_recomputes_stats() {
        let (history, moves, best) = sample();
        let review = GameReview::new(
            GameInfo {
                white: Some("Morphy".to_string()),
                ..GameInfo::default()
            },
            STARTPOS.to_string(),
            13,
            history,
            moves,
            best,
        )
        .unwrap();

        let json = review.to_json().unwrap();
        assert!(json.contains("\"BLUNDER\""));
        let loaded = GameReview::from_json(&json).unwrap();
        assert_eq!(loaded.info(), review.info());
        assert_eq!(loaded.evaluation_history(), review.evaluation_history());
        assert_eq!(loaded.best_moves(), review.best_moves());
        assert_eq!(loaded.black_stats().counts, review.black_stats().counts);
        assert!((loaded.black_stats().accuracy - review.black_stats().accuracy).abs() < 1e-9);
    }

    #[test]
    fn from_json_rejects_unreplayable_moves() {
        let (history, moves, best) = sample();
        let review = GameReview::new(
            GameInfo::default(),
            STARTPOS.to_string(),
            13,
            history,
            moves,
            best,
        )
        .unwrap();
        let json = review.to_json().unwrap().replace("f7f6", "f7f4");
        assert!(matches!(
            GameReview::from_json(&json),
            Err(ReviewError::Replay { ply: 1, .. })
        ));
    }

    #[test]
    fn game_info_ignores_placeholders() {
        let game = chess_core::parse_pgn(
            "[White \"Anderssen\"]\n[Black \"?\"]\n[Result \"*\"]\n\n1. e4 *",
        )
        .unwrap();
        let info = GameInfo::from_pgn(&game);
        assert_eq!(info.white.as_deref(), Some("Anderssen"));
        assert_eq!(info.black, None);
        assert_eq!(info.result, None);
    }

    proptest! {
        #[test]
        fn engine_choice_is_always_best(
            len in 1usize..=RUY_LOPEZ.len(),
            scores in prop::collection::vec(-1_500i32..1_500, RUY_LOPEZ.len() + 1),
            picks in prop::collection::vec(0u8..3, RUY_LOPEZ.len() + 1),
        ) {
            let history = scores[..=len].to_vec();
            // 0: the move actually played, 1: a move never played, 2: no suggestion
            let best: Vec<Option<String>> = picks[..=len]
                .iter()
                .enumerate()
                .map(|(i, pick)| match pick {
                    0 => RUY_LOPEZ.get(i).map(|m| m.to_string()),
                    1 => Some("a2a3".to_string()),
                    _ => None,
                })
                .collect();

            let mut board = Board::startpos();
            let mut records = Vec::new();
            for (ply, uci) in RUY_LOPEZ[..len].iter().enumerate() {
                let played = board.play_uci(uci).unwrap();
                let was_best = best[ply].as_deref() == Some(*uci);
                let j = judge_move(history[ply], history[ply + 1], played.color, was_best);
                records.push(MoveRecord::new(&played, j.classification, j.accuracy));
            }

            let review = GameReview::new(
                GameInfo::default(),
                STARTPOS.to_string(),
                13,
                history,
                records,
                best.clone(),
            );
            prop_assert!(review.is_ok());
            let review = review.unwrap();
            for (ply, record) in review.moves().iter().enumerate() {
                if best[ply].as_deref() == Some(record.uci.as_str()) {
                    prop_assert_eq!(record.classification, Classification::Best);
                }
            }
        }
    }
}
