//! Drives a [`PuzzleSession`] in real time.
//!
//! The opponent's scripted reply is played after a fixed delay by a spawned
//! timer task. Loading another puzzle or retrying aborts the timer, and the
//! session refuses the timer's ticket if it fires anyway.

use std::sync::Arc;
use std::time::Duration;

use chess_core::PlayedMove;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::puzzle::{PuzzleDefinition, PuzzleError};
use crate::session::{MoveOutcome, PuzzleSession, PuzzleSessionState, ReplyOutcome, ReplyTicket};

/// Default pause before the opponent answers.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

/// Things that happen to a session outside a method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleEvent {
    /// The opponent's reply was played.
    ReplyPlayed { puzzle_id: String, played: PlayedMove },
    /// The scripted reply was illegal and skipped.
    ReplySkipped { puzzle_id: String, mv: String },
}

/// Owns the active session and its reply timer.
pub struct PuzzleRunner {
    session: Arc<Mutex<PuzzleSession>>,
    reply_delay: Duration,
    timer: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<PuzzleEvent>,
}

impl PuzzleRunner {
    /// Starts a session on `puzzle`. Events arrive on the returned receiver.
    pub fn new(
        puzzle: PuzzleDefinition,
        reply_delay: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PuzzleEvent>), PuzzleError> {
        let session = PuzzleSession::new(puzzle)?;
        let (events, rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                session: Arc::new(Mutex::new(session)),
                reply_delay,
                timer: None,
                events,
            },
            rx,
        ))
    }

    /// Replaces the active session with a fresh one on `puzzle`.
    pub async fn load(&mut self, puzzle: PuzzleDefinition) -> Result<(), PuzzleError> {
        let session = PuzzleSession::new(puzzle)?;
        self.cancel_timer();
        *self.session.lock().await = session;
        Ok(())
    }

    pub async fn state(&self) -> PuzzleSessionState {
        self.session.lock().await.state()
    }

    /// The active puzzle.
    pub async fn puzzle(&self) -> PuzzleDefinition {
        self.session.lock().await.puzzle().clone()
    }

    /// Submits a solver move, scheduling the reply when one is owed.
    pub async fn submit_move(&mut self, uci: &str) -> MoveOutcome {
        let outcome = self.session.lock().await.submit_move(uci);
        if let MoveOutcome::Correct { reply, .. } = &outcome {
            self.schedule_reply(*reply);
        }
        outcome
    }

    pub async fn retry(&mut self) -> Result<(), PuzzleError> {
        let mut session = self.session.lock().await;
        session.retry()?;
        drop(session);
        self.cancel_timer();
        Ok(())
    }

    pub async fn hint(&mut self) -> Result<String, PuzzleError> {
        self.session.lock().await.hint()
    }

    fn schedule_reply(&mut self, ticket: ReplyTicket) {
        self.cancel_timer();
        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let delay = self.reply_delay;

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut session = session.lock().await;
            let puzzle_id = session.puzzle().id.clone();
            let event = match session.apply_reply(ticket) {
                ReplyOutcome::Applied(played) => PuzzleEvent::ReplyPlayed { puzzle_id, played },
                ReplyOutcome::Skipped { mv } => PuzzleEvent::ReplySkipped { puzzle_id, mv },
                ReplyOutcome::Stale => {
                    debug!(index = ticket.index(), "stale reply timer ignored");
                    return;
                }
            };
            let _ = events.send(event);
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for PuzzleRunner {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_puzzles;
    use crate::session::PuzzleStatus;

    fn puzzle(id: &str) -> PuzzleDefinition {
        builtin_puzzles()
            .into_iter()
            .find(|p| p.id == id)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_after_delay() {
        let (mut runner, mut events) = PuzzleRunner::new(puzzle("1"), DEFAULT_REPLY_DELAY).unwrap();
        assert!(matches!(
            runner.submit_move("b3b8").await,
            MoveOutcome::Correct { .. }
        ));
        assert_eq!(runner.state().await.solved_move_count, 1);

        let event = events.recv().await.unwrap();
        let PuzzleEvent::ReplyPlayed { puzzle_id, played } = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(puzzle_id, "1");
        assert_eq!(played.uci, "d7b8");
        assert_eq!(runner.state().await.solved_move_count, 2);

        assert!(matches!(
            runner.submit_move("d1d8").await,
            MoveOutcome::Solved { .. }
        ));
        assert_eq!(runner.state().await.status, PuzzleStatus::Solved);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_waits_for_delay() {
        let (mut runner, _events) = PuzzleRunner::new(puzzle("2"), DEFAULT_REPLY_DELAY).unwrap();
        runner.submit_move("c4g8").await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(runner.state().await.solved_move_count, 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runner.state().await.solved_move_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_cancels_pending_reply() {
        let (mut runner, mut events) = PuzzleRunner::new(puzzle("1"), DEFAULT_REPLY_DELAY).unwrap();
        runner.submit_move("b3b8").await;
        runner.load(puzzle("7")).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = runner.state().await;
        assert_eq!(state.puzzle_id, "7");
        assert_eq!(state.solved_move_count, 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn one_move_puzzle_schedules_nothing() {
        let (mut runner, mut events) = PuzzleRunner::new(puzzle("7"), DEFAULT_REPLY_DELAY).unwrap();
        assert!(matches!(
            runner.submit_move("b7h7").await,
            MoveOutcome::Solved { .. }
        ));
        assert!(runner.timer.is_none());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_failure() {
        let (mut runner, _events) = PuzzleRunner::new(puzzle("12"), DEFAULT_REPLY_DELAY).unwrap();
        assert!(matches!(
            runner.submit_move("g1f1").await,
            MoveOutcome::Failed { .. }
        ));
        assert_eq!(runner.hint().await, Err(PuzzleError::WrongStatus {
            expected: PuzzleStatus::Solving,
            actual: PuzzleStatus::Failed,
        }));
        runner.retry().await.unwrap();
        assert_eq!(runner.hint().await.unwrap(), "d1");
    }
}
