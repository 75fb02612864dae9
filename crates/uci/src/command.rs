//! Lines the client writes to the engine.

use std::fmt::Write;

use crate::UciError;

#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    Uci,
    SetOption { name: String, value: Option<String> },
    UciNewGame,
    IsReady,
    /// `fen: None` means the standard start position.
    Position { fen: Option<String>, moves: Vec<String> },
    Go(GoOptions),
    Stop,
    Quit,
    /// A command this crate does not model, kept verbatim.
    Unknown(String),
}

/// Search limits for `go`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    pub depth: Option<u32>,
    pub movetime: Option<u64>,
    /// Search until `stop`.
    pub infinite: bool,
}

impl GoOptions {
    /// Search to `depth` plies.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }
}

impl GuiCommand {
    /// `position fen <fen>` with no moves.
    pub fn position_fen(fen: impl Into<String>) -> Self {
        GuiCommand::Position {
            fen: Some(fen.into()),
            moves: Vec::new(),
        }
    }

    /// The protocol line, without the trailing newline.
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".into(),
            GuiCommand::UciNewGame => "ucinewgame".into(),
            GuiCommand::IsReady => "isready".into(),
            GuiCommand::Stop => "stop".into(),
            GuiCommand::Quit => "quit".into(),
            GuiCommand::SetOption { name, value: None } => format!("setoption name {name}"),
            GuiCommand::SetOption {
                name,
                value: Some(value),
            } => format!("setoption name {name} value {value}"),
            GuiCommand::Position { fen, moves } => {
                let mut line = match fen {
                    Some(fen) => format!("position fen {fen}"),
                    None => "position startpos".into(),
                };
                if !moves.is_empty() {
                    let _ = write!(line, " moves {}", moves.join(" "));
                }
                line
            }
            GuiCommand::Go(opts) => {
                let mut line = String::from("go");
                if let Some(depth) = opts.depth {
                    let _ = write!(line, " depth {depth}");
                }
                if let Some(ms) = opts.movetime {
                    let _ = write!(line, " movetime {ms}");
                }
                if opts.infinite {
                    line.push_str(" infinite");
                }
                line
            }
            GuiCommand::Unknown(line) => line.clone(),
        }
    }

    /// Reads a command line the way an engine would.
    ///
    /// Scripted test engines use this to follow what the client sent.
    pub fn parse(input: &str) -> Result<Self, UciError> {
        let input = input.trim();
        let mut tokens = input.split_whitespace();

        let command = match tokens.next() {
            Some("uci") => GuiCommand::Uci,
            Some("ucinewgame") => GuiCommand::UciNewGame,
            Some("isready") => GuiCommand::IsReady,
            Some("stop") => GuiCommand::Stop,
            Some("quit") => GuiCommand::Quit,
            Some("setoption") => parse_setoption(tokens)?,
            Some("position") => parse_position(tokens)?,
            Some("go") => GuiCommand::Go(parse_go(tokens)),
            _ => GuiCommand::Unknown(input.to_string()),
        };
        Ok(command)
    }
}

fn parse_setoption<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<GuiCommand, UciError> {
    if tokens.next() != Some("name") {
        return Err(UciError::InvalidCommand("setoption without name".into()));
    }

    let mut name = Vec::new();
    let mut value: Option<Vec<&str>> = None;
    for token in tokens {
        match value.as_mut() {
            Some(value) => value.push(token),
            None if token == "value" => value = Some(Vec::new()),
            None => name.push(token),
        }
    }
    if name.is_empty() {
        return Err(UciError::InvalidCommand("setoption with empty name".into()));
    }

    Ok(GuiCommand::SetOption {
        name: name.join(" "),
        value: value.map(|v| v.join(" ")),
    })
}

fn parse_position<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<GuiCommand, UciError> {
    let fen = match tokens.next() {
        Some("startpos") => match tokens.next() {
            None | Some("moves") => None,
            Some(other) => {
                return Err(UciError::ParseError(format!("expected 'moves', got '{other}'")))
            }
        },
        Some("fen") => {
            let fields: Vec<&str> = tokens.by_ref().take_while(|t| *t != "moves").collect();
            if fields.is_empty() {
                return Err(UciError::ParseError("empty FEN".into()));
            }
            Some(fields.join(" "))
        }
        other => {
            return Err(UciError::ParseError(format!(
                "expected 'startpos' or 'fen', got {other:?}"
            )))
        }
    };

    Ok(GuiCommand::Position {
        fen,
        moves: tokens.map(str::to_string).collect(),
    })
}

fn parse_go<'a>(mut tokens: impl Iterator<Item = &'a str>) -> GoOptions {
    let mut opts = GoOptions::default();
    while let Some(token) = tokens.next() {
        match token {
            "depth" => opts.depth = tokens.next().and_then(|t| t.parse().ok()),
            "movetime" => opts.movetime = tokens.next().and_then(|t| t.parse().ok()),
            "infinite" => opts.infinite = true,
            _ => {}
        }
    }
    opts
}
