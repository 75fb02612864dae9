//! Whole-game analysis.
//!
//! [`GameAnalyzer`] evaluates the initial position and then the position
//! after every move, one search at a time, and turns the scores into a
//! [`GameReview`].

use chess_core::{Board, BoardError, PgnGame};
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{EngineError, PositionEvaluator};
use crate::quality::judge_move;
use crate::review::{GameInfo, GameReview, MoveRecord, ReviewError};

/// Errors that can occur during game analysis.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error from the analysis engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    /// The game has nothing to analyze.
    #[error("Invalid game data: {0}")]
    InvalidGame(String),
    /// A move could not be replayed.
    #[error("Board error at move {ply}: {source}")]
    Board {
        ply: usize,
        #[source]
        source: BoardError,
    },
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),
}

/// How far a batch analysis has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisProgress {
    /// Moves evaluated so far.
    pub completed: usize,
    pub total: usize,
    /// `round(completed / total * 100)`.
    pub percent: u8,
}

impl AnalysisProgress {
    fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Analyzes complete games with a single evaluator.
pub struct GameAnalyzer<E> {
    evaluator: E,
    depth: u32,
}

impl<E: PositionEvaluator> GameAnalyzer<E> {
    pub fn new(evaluator: E, depth: u32) -> Self {
        Self {
            evaluator,
            depth: depth.max(1),
        }
    }

    /// Runs the batch analysis.
    ///
    /// Positions are evaluated strictly one after another, so `on_progress`
    /// sees `completed` go 1, 2, ..., N.
    ///
    /// # Errors
    ///
    /// [`AnalyzerError::InvalidGame`] for a game without moves (checked
    /// before any engine call), [`AnalyzerError::Engine`] if any search
    /// fails. No partial review is produced.
    pub async fn analyze<F>(
        &self,
        game: &PgnGame,
        mut on_progress: F,
    ) -> Result<GameReview, AnalyzerError>
    where
        F: FnMut(AnalysisProgress),
    {
        let total = game.moves.len();
        if total == 0 {
            return Err(AnalyzerError::InvalidGame("game has no moves".to_string()));
        }

        let mut board = Board::from_fen(&game.initial_fen)
            .map_err(|source| AnalyzerError::Board { ply: 0, source })?;

        info!(moves = total, depth = self.depth, "analyzing game");

        let initial = self.evaluator.evaluate(&board.fen(), self.depth).await?;
        let mut history = Vec::with_capacity(total + 1);
        let mut best_moves = Vec::with_capacity(total + 1);
        history.push(initial.score);
        best_moves.push(initial.best_move);

        let mut records = Vec::with_capacity(total);
        for (ply, played) in game.moves.iter().enumerate() {
            board
                .play_uci(&played.uci)
                .map_err(|source| AnalyzerError::Board { ply, source })?;

            let sample = self.evaluator.evaluate(&board.fen(), self.depth).await?;
            let prev = history[ply];
            let was_best = best_moves[ply].as_deref() == Some(played.uci.as_str());
            let judgement = judge_move(prev, sample.score, played.color, was_best);

            debug!(
                ply,
                san = %played.san,
                score = sample.score,
                classification = %judgement.classification,
                "move analyzed"
            );

            history.push(sample.score);
            best_moves.push(sample.best_move);
            records.push(MoveRecord::new(
                played,
                judgement.classification,
                judgement.accuracy,
            ));
            on_progress(AnalysisProgress::new(ply + 1, total));
        }

        let review = GameReview::new(
            GameInfo::from_pgn(game),
            game.initial_fen.clone(),
            self.depth,
            history,
            records,
            best_moves,
        )?;
        info!(
            white_accuracy = review.white_stats().accuracy,
            black_accuracy = review.black_stats().accuracy,
            "analysis complete"
        );
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_rounds() {
        assert_eq!(AnalysisProgress::new(1, 3).percent, 33);
        assert_eq!(AnalysisProgress::new(2, 3).percent, 67);
        assert_eq!(AnalysisProgress::new(3, 3).percent, 100);
        assert_eq!(AnalysisProgress::new(0, 0).percent, 100);
    }
}
