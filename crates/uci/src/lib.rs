//! Client side of the UCI (Universal Chess Interface) protocol.
//!
//! This crate formats the commands a GUI sends to an analysis engine and
//! parses the lines the engine streams back.
//!
//! # Outbound
//!
//! - `uci` - Identify protocol, engine answers with `id` lines and `uciok`
//! - `setoption name <name> value <value>` - Configure an option
//! - `ucinewgame` - Reset engine state between games
//! - `isready` / `readyok` - Synchronization
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go depth <d>` - Start a bounded search
//! - `stop` / `quit`
//!
//! # Inbound
//!
//! - `info depth <d> score (cp <x> | mate <n>) ... pv <moves>` - Search progress
//! - `bestmove <move> [ponder <move>]` - Terminal line of a search

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{Bound, EngineInfo, InfoBuilder, Score};

use thiserror::Error;

/// A command line that could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UciError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `None` when the engine reports `(none)` or `0000`.
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Option declaration, only the name is kept.
    Option(String),
    /// Anything else. Kept verbatim so callers can log it.
    Unknown(String),
}

impl EngineMessage {
    /// Parse a line received from the engine.
    ///
    /// Never fails: lines that are not understood come back as
    /// [`EngineMessage::Unknown`].
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next().unwrap_or("") {
            "uciok" => EngineMessage::UciOk,
            "readyok" => EngineMessage::ReadyOk,
            "info" => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Unknown(line.to_string()),
            },
            "bestmove" => {
                let mv = parts.next().and_then(real_move);
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().and_then(real_move),
                    _ => None,
                };
                EngineMessage::BestMove { mv, ponder }
            }
            "id" => {
                let rest = |prefix: &str| {
                    line.strip_prefix(prefix)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                };
                match parts.next() {
                    Some("name") => EngineMessage::Id {
                        name: rest("id name"),
                        author: None,
                    },
                    Some("author") => EngineMessage::Id {
                        name: None,
                        author: rest("id author"),
                    },
                    _ => EngineMessage::Unknown(line.to_string()),
                }
            }
            "option" => {
                let tokens: Vec<&str> = parts.collect();
                match tokens.first() {
                    Some(&"name") => {
                        let name: Vec<&str> = tokens[1..]
                            .iter()
                            .take_while(|t| **t != "type")
                            .copied()
                            .collect();
                        EngineMessage::Option(name.join(" "))
                    }
                    _ => EngineMessage::Unknown(line.to_string()),
                }
            }
            _ => EngineMessage::Unknown(line.to_string()),
        }
    }

    /// Format message as the engine would print it.
    pub fn to_uci(&self) -> String {
        match self {
            EngineMessage::Id { name, author } => {
                let mut parts = Vec::new();
                if let Some(n) = name {
                    parts.push(format!("id name {}", n));
                }
                if let Some(a) = author {
                    parts.push(format!("id author {}", a));
                }
                parts.join("\n")
            }
            EngineMessage::UciOk => "uciok".to_string(),
            EngineMessage::ReadyOk => "readyok".to_string(),
            EngineMessage::Info(info) => info.to_uci(),
            EngineMessage::BestMove { mv, ponder } => {
                let mv = mv.as_deref().unwrap_or("(none)");
                match ponder {
                    Some(p) => format!("bestmove {} ponder {}", mv, p),
                    None => format!("bestmove {}", mv),
                }
            }
            EngineMessage::Option(name) => format!("option name {} type string", name),
            EngineMessage::Unknown(line) => line.clone(),
        }
    }
}

/// Filter out the placeholder moves engines print when there is no legal move.
fn real_move(token: &str) -> Option<String> {
    match token {
        "(none)" | "none" | "0000" => None,
        mv => Some(mv.to_string()),
    }
}
