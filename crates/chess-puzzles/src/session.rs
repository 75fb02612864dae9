//! Puzzle solving state machine.
//!
//! A [`PuzzleSession`] moves between three states:
//!
//! ```text
//! solving --wrong move--> failed --retry--> solving
//! solving --last correct move--> solved
//! ```
//!
//! After a correct move that is not the last, the opponent's scripted reply
//! is owed. The session hands out a [`ReplyTicket`] for it; whoever drives
//! the session (usually [`crate::PuzzleRunner`]) redeems the ticket later
//! with [`PuzzleSession::apply_reply`]. Tickets from an earlier session,
//! an earlier attempt, or for a reply already played are refused.

use std::sync::atomic::{AtomicU64, Ordering};

use chess_core::{Board, BoardError, Color, PlayedMove};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::puzzle::{PuzzleDefinition, PuzzleError};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleStatus {
    Solving,
    Solved,
    Failed,
}

impl std::fmt::Display for PuzzleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PuzzleStatus::Solving => "solving",
            PuzzleStatus::Solved => "solved",
            PuzzleStatus::Failed => "failed",
        })
    }
}

/// Claim on one scheduled opponent reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTicket {
    session: u64,
    epoch: u64,
    index: usize,
}

impl ReplyTicket {
    /// Solution index of the reply.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Result of [`PuzzleSession::submit_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Not a legal move here. Nothing changed.
    Rejected(BoardError),
    /// The session is not accepting moves right now. Nothing changed.
    Ignored,
    /// Right move; the opponent's reply is owed.
    Correct { played: PlayedMove, reply: ReplyTicket },
    /// Right move, and the last one.
    Solved { played: PlayedMove },
    /// Legal but wrong. The session is now failed.
    Failed { played: PlayedMove },
}

/// Result of [`PuzzleSession::apply_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Applied(PlayedMove),
    /// The scripted reply is not legal; it was skipped.
    Skipped { mv: String },
    /// The ticket no longer matches this session's state.
    Stale,
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleSessionState {
    pub puzzle_id: String,
    pub fen: String,
    pub solved_move_count: usize,
    pub status: PuzzleStatus,
    pub hint_square: Option<String>,
}

/// One attempt at one puzzle.
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    puzzle: PuzzleDefinition,
    board: Board,
    solved_move_count: usize,
    status: PuzzleStatus,
    hint_square: Option<String>,
    id: u64,
    /// Bumped on retry so tickets from the failed attempt go stale.
    epoch: u64,
    pending_reply: Option<usize>,
}

impl PuzzleSession {
    /// Starts solving `puzzle` from its initial position.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::InvalidPosition`] if the starting FEN is unusable.
    pub fn new(puzzle: PuzzleDefinition) -> Result<Self, PuzzleError> {
        let board = Board::from_fen(&puzzle.fen).map_err(|source| PuzzleError::InvalidPosition {
            id: puzzle.id.clone(),
            source,
        })?;
        Ok(Self {
            puzzle,
            board,
            solved_move_count: 0,
            status: PuzzleStatus::Solving,
            hint_square: None,
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
            pending_reply: None,
        })
    }

    pub fn puzzle(&self) -> &PuzzleDefinition {
        &self.puzzle
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        self.board.fen()
    }

    pub fn status(&self) -> PuzzleStatus {
        self.status
    }

    pub fn solved_move_count(&self) -> usize {
        self.solved_move_count
    }

    pub fn hint_square(&self) -> Option<&str> {
        self.hint_square.as_deref()
    }

    pub fn player_color(&self) -> Color {
        self.puzzle.player_color()
    }

    /// True while an opponent reply is owed.
    pub fn awaiting_reply(&self) -> bool {
        self.pending_reply.is_some()
    }

    pub fn state(&self) -> PuzzleSessionState {
        PuzzleSessionState {
            puzzle_id: self.puzzle.id.clone(),
            fen: self.board.fen(),
            solved_move_count: self.solved_move_count,
            status: self.status,
            hint_square: self.hint_square.clone(),
        }
    }

    /// Next solution entry, normalised to lowercase long notation.
    fn expected(&self) -> Option<String> {
        self.puzzle
            .solution
            .get(self.solved_move_count)
            .map(|mv| mv.trim().to_ascii_lowercase())
    }

    /// Checks the solver's move against the solution.
    pub fn submit_move(&mut self, uci: &str) -> MoveOutcome {
        if self.status != PuzzleStatus::Solving
            || self.pending_reply.is_some()
            || !self.puzzle.is_player_move(self.solved_move_count)
        {
            return MoveOutcome::Ignored;
        }
        let Some(expected) = self.expected() else {
            return MoveOutcome::Ignored;
        };

        let uci = uci.trim().to_ascii_lowercase();
        let played = match self.board.play_uci(&uci) {
            Ok(played) => played,
            Err(e) => return MoveOutcome::Rejected(e),
        };

        if uci != expected {
            debug!(puzzle = %self.puzzle.id, played = %uci, expected = %expected, "wrong move");
            self.status = PuzzleStatus::Failed;
            return MoveOutcome::Failed { played };
        }

        self.solved_move_count += 1;
        self.hint_square = None;
        if self.solved_move_count == self.puzzle.solution.len() {
            self.status = PuzzleStatus::Solved;
            return MoveOutcome::Solved { played };
        }

        let index = self.solved_move_count;
        self.pending_reply = Some(index);
        MoveOutcome::Correct {
            played,
            reply: ReplyTicket {
                session: self.id,
                epoch: self.epoch,
                index,
            },
        }
    }

    /// Plays the scripted opponent reply a ticket was issued for.
    ///
    /// An illegal scripted reply is logged and skipped; the session stays
    /// in `solving` and the solver's next solution move becomes due even
    /// though the board never saw the reply. A reply that uses up the line
    /// solves the puzzle.
    pub fn apply_reply(&mut self, ticket: ReplyTicket) -> ReplyOutcome {
        if ticket.session != self.id
            || ticket.epoch != self.epoch
            || self.status != PuzzleStatus::Solving
            || self.pending_reply != Some(ticket.index)
        {
            return ReplyOutcome::Stale;
        }
        self.pending_reply = None;

        let mv = self.puzzle.solution[ticket.index].clone();
        let outcome = match self.board.play_uci(&mv) {
            Ok(played) => ReplyOutcome::Applied(played),
            Err(e) => {
                error!(
                    puzzle = %self.puzzle.id,
                    index = ticket.index,
                    mv = %mv,
                    error = %e,
                    "scripted reply is not legal, skipping it"
                );
                ReplyOutcome::Skipped { mv }
            }
        };
        self.solved_move_count += 1;
        if self.solved_move_count == self.puzzle.solution.len() {
            debug!(puzzle = %self.puzzle.id, "line finished on a reply");
            self.status = PuzzleStatus::Solved;
        }
        outcome
    }

    /// Returns a failed session to the last correct position.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::WrongStatus`] unless the session is failed.
    pub fn retry(&mut self) -> Result<(), PuzzleError> {
        if self.status != PuzzleStatus::Failed {
            return Err(PuzzleError::WrongStatus {
                expected: PuzzleStatus::Failed,
                actual: self.status,
            });
        }

        let mut board =
            Board::from_fen(&self.puzzle.fen).map_err(|source| PuzzleError::InvalidPosition {
                id: self.puzzle.id.clone(),
                source,
            })?;
        for (index, mv) in self.puzzle.solution[..self.solved_move_count]
            .iter()
            .enumerate()
        {
            if let Err(source) = board.play_uci(mv) {
                // Same skip as apply_reply: keep going without it.
                error!(puzzle = %self.puzzle.id, index, mv = %mv, error = %source, "solution move skipped on retry");
            }
        }

        self.board = board;
        self.status = PuzzleStatus::Solving;
        self.hint_square = None;
        self.pending_reply = None;
        self.epoch += 1;
        Ok(())
    }

    /// Reveals the origin square of the next solution move.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::WrongStatus`] unless solving,
    /// [`PuzzleError::AwaitingReply`] while the opponent is to move,
    /// [`PuzzleError::LineFinished`] when no solution move is left.
    pub fn hint(&mut self) -> Result<String, PuzzleError> {
        if self.status != PuzzleStatus::Solving {
            return Err(PuzzleError::WrongStatus {
                expected: PuzzleStatus::Solving,
                actual: self.status,
            });
        }
        if self.pending_reply.is_some() {
            return Err(PuzzleError::AwaitingReply);
        }
        let expected = self.expected().ok_or(PuzzleError::LineFinished)?;
        let square: String = expected.chars().take(2).collect();
        self.hint_square = Some(square.clone());
        Ok(square)
    }
}
