//! Stepping through a finished review.

use chess_core::{Board, BoardError, Color};
use serde::Serialize;
use thiserror::Error;

use crate::quality::Classification;
use crate::review::GameReview;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("already at the initial position")]
    AtStart,
    #[error("already at the last move")]
    AtEnd,
    #[error("move index {index} out of range (-1..={last})")]
    OutOfRange { index: isize, last: isize },
    #[error("cannot replay move {ply}: {source}")]
    Replay {
        ply: usize,
        #[source]
        source: BoardError,
    },
}

/// The move that produced the displayed position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub san: String,
    pub uci: String,
    pub side: Color,
    pub classification: Classification,
}

/// Everything shown for one cursor position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewFrame {
    /// -1 for the initial position.
    pub cursor: isize,
    pub fen: String,
    pub side_to_move: Color,
    /// White-perspective score of this position.
    pub evaluation: i32,
    pub last_move: Option<LastMove>,
    /// Engine's choice in the position before the displayed move. At the
    /// initial position this is the engine's first move.
    pub engine_best: Option<String>,
}

/// Cursor over a [`GameReview`], from -1 (initial position) to N-1.
///
/// Every move rebuilds the position by replaying from the initial FEN.
#[derive(Debug)]
pub struct ReviewNavigator<'a> {
    review: &'a GameReview,
    cursor: isize,
    board: Board,
}

impl<'a> ReviewNavigator<'a> {
    /// Starts at the initial position.
    pub fn new(review: &'a GameReview) -> Result<Self, NavigationError> {
        let board = Board::from_fen(review.initial_fen())
            .map_err(|source| NavigationError::Replay { ply: 0, source })?;
        Ok(Self {
            review,
            cursor: -1,
            board,
        })
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Number of moves in the review.
    pub fn len(&self) -> usize {
        self.review.len()
    }

    pub fn is_empty(&self) -> bool {
        self.review.is_empty()
    }

    fn last_index(&self) -> isize {
        self.review.len() as isize - 1
    }

    /// The frame at the cursor.
    pub fn current(&self) -> ReviewFrame {
        let k = self.cursor;
        let i = k.max(0) as usize;
        let engine_best = self.review.best_moves()[i].clone();
        let last_move = (k >= 0).then(|| {
            let record = &self.review.moves()[i];
            LastMove {
                from: record.from.clone(),
                to: record.to.clone(),
                san: record.san.clone(),
                uci: record.uci.clone(),
                side: record.side,
                classification: record.classification,
            }
        });

        ReviewFrame {
            cursor: k,
            fen: self.board.fen(),
            side_to_move: self.board.side_to_move(),
            evaluation: self.review.evaluation_history()[(k + 1) as usize],
            last_move,
            engine_best,
        }
    }

    pub fn advance(&mut self) -> Result<ReviewFrame, NavigationError> {
        if self.cursor >= self.last_index() {
            return Err(NavigationError::AtEnd);
        }
        self.jump_to(self.cursor + 1)
    }

    /// From 0 this lands on -1, the initial position.
    pub fn retreat(&mut self) -> Result<ReviewFrame, NavigationError> {
        if self.cursor <= -1 {
            return Err(NavigationError::AtStart);
        }
        self.jump_to(self.cursor - 1)
    }

    /// Moves the cursor to `index`, replaying moves `0..=index` from scratch.
    ///
    /// On error the cursor and position are unchanged.
    pub fn jump_to(&mut self, index: isize) -> Result<ReviewFrame, NavigationError> {
        let last = self.last_index();
        if index < -1 || index > last {
            return Err(NavigationError::OutOfRange { index, last });
        }

        let mut board = Board::from_fen(self.review.initial_fen())
            .map_err(|source| NavigationError::Replay { ply: 0, source })?;
        for (ply, record) in self
            .review
            .moves()
            .iter()
            .take((index + 1) as usize)
            .enumerate()
        {
            board
                .play_uci(&record.uci)
                .map_err(|source| NavigationError::Replay { ply, source })?;
        }

        self.board = board;
        self.cursor = index;
        Ok(self.current())
    }

    /// Jumps to the first move.
    pub fn start(&mut self) -> Result<ReviewFrame, NavigationError> {
        self.jump_to(0)
    }

    /// Back to the initial position.
    pub fn reset(&mut self) -> Result<ReviewFrame, NavigationError> {
        self.jump_to(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::judge_move;
    use crate::review::{GameInfo, MoveRecord};
    use chess_core::STARTPOS;

    fn review() -> GameReview {
        let ucis = ["e2e4", "e7e5", "g1f3", "b8c6"];
        let history = vec![15, 20, 25, 30, 28];
        let best: Vec<Option<String>> = vec![
            Some("e2e4".into()),
            Some("c7c5".into()),
            Some("g1f3".into()),
            Some("b8c6".into()),
            Some("f1b5".into()),
        ];
        let mut board = Board::startpos();
        let moves = ucis
            .iter()
            .enumerate()
            .map(|(i, uci)| {
                let played = board.play_uci(uci).unwrap();
                let was_best = best[i].as_deref() == Some(*uci);
                let j = judge_move(history[i], history[i + 1], played.color, was_best);
                MoveRecord::new(&played, j.classification, j.accuracy)
            })
            .collect();
        GameReview::new(GameInfo::default(), STARTPOS.to_string(), 13, history, moves, best)
            .unwrap()
    }

    #[test]
    fn starts_before_first_move() {
        let review = review();
        let nav = ReviewNavigator::new(&review).unwrap();
        let frame = nav.current();
        assert_eq!(frame.cursor, -1);
        assert_eq!(frame.fen, STARTPOS);
        assert_eq!(frame.evaluation, 15);
        assert!(frame.last_move.is_none());
        assert_eq!(frame.engine_best.as_deref(), Some("e2e4"));
    }

    #[test]
    fn frame_uses_shifted_history_and_prior_best_move() {
        let review = review();
        let mut nav = ReviewNavigator::new(&review).unwrap();
        let frame = nav.jump_to(1).unwrap();
        assert_eq!(frame.evaluation, 25);
        // Suggestion for the position before e7e5
        assert_eq!(frame.engine_best.as_deref(), Some("c7c5"));
        let last = frame.last_move.unwrap();
        assert_eq!(last.from, "e7");
        assert_eq!(last.to, "e5");
        assert_eq!(last.san, "e5");
        assert_eq!(frame.side_to_move, Color::White);
    }

    #[test]
    fn bounds() {
        let review = review();
        let mut nav = ReviewNavigator::new(&review).unwrap();
        assert_eq!(nav.retreat(), Err(NavigationError::AtStart));

        nav.jump_to(3).unwrap();
        assert_eq!(nav.advance(), Err(NavigationError::AtEnd));
        assert_eq!(nav.cursor(), 3);

        assert_eq!(
            nav.jump_to(4),
            Err(NavigationError::OutOfRange { index: 4, last: 3 })
        );
        assert!(nav.jump_to(-2).is_err());
        assert_eq!(nav.cursor(), 3);
    }

    #[test]
    fn retreat_from_first_move_reaches_initial_position() {
        let review = review();
        let mut nav = ReviewNavigator::new(&review).unwrap();
        assert_eq!(nav.start().unwrap().cursor, 0);
        let frame = nav.retreat().unwrap();
        assert_eq!(frame.cursor, -1);
        assert_eq!(frame.fen, STARTPOS);
    }

    #[test]
    fn jump_is_idempotent() {
        let review = review();
        let mut nav = ReviewNavigator::new(&review).unwrap();
        nav.jump_to(3).unwrap();
        nav.retreat().unwrap();
        let first = nav.jump_to(2).unwrap();
        let second = nav.jump_to(2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stepping_matches_direct_jump() {
        let review = review();
        let mut nav = ReviewNavigator::new(&review).unwrap();
        let mut stepped = nav.current();
        while let Ok(frame) = nav.advance() {
            stepped = frame;
        }
        let replayed = Board::replay(STARTPOS, review.moves().iter().map(|m| m.uci.as_str()))
            .unwrap();
        assert_eq!(stepped.fen, replayed.fen());

        nav.reset().unwrap();
        assert_eq!(nav.jump_to(3).unwrap(), stepped);
    }
}
