//! Checkmate puzzles: definitions, a catalog and the solving state machine.
//!
//! A puzzle is a starting position plus a forced line in long notation,
//! alternating solver and opponent moves. [`PuzzleSession`] checks the
//! solver's moves and plays the opponent's replies; [`PuzzleRunner`] adds the
//! real-time delay before each reply.

pub mod builtin;
pub mod catalog;
pub mod puzzle;
pub mod runner;
pub mod session;

pub use catalog::{CatalogError, PuzzleCatalog};
pub use puzzle::{PuzzleDefinition, PuzzleError};
pub use runner::{PuzzleEvent, PuzzleRunner, DEFAULT_REPLY_DELAY};
pub use session::{
    MoveOutcome, PuzzleSession, PuzzleSessionState, PuzzleStatus, ReplyOutcome, ReplyTicket,
};
