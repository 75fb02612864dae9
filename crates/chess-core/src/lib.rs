//! Board state and move notation for the review tools.
//!
//! Rules and notation come from [`shakmaty`], PGN reading from
//! [`pgn_reader`]; this crate wraps them in a small owned API:
//! - [`Board`] for position setup, move application and FEN output
//! - [`Color`] for the side to move
//! - [`PlayedMove`] carrying long and short notation of an applied move
//! - [`pgn::parse_pgn`] for importing a game

mod board;
mod color;
mod fen;
mod mov;
pub mod pgn;
mod san;

pub use board::{Board, BoardError};
pub use color::Color;
pub use fen::{FenError, STARTPOS};
pub use mov::PlayedMove;
pub use pgn::{parse_pgn, PgnError, PgnGame};
