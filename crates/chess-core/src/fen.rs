//! FEN (Forsyth-Edwards Notation) field handling.
//!
//! Placement and legality are checked by shakmaty. This module checks the
//! field layout first and fills in missing move counters.

use thiserror::Error;

/// The standard starting position FEN.
pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 4 to 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// A FEN string split into its position fields and move counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FenFields {
    /// Placement, active color, castling and en passant fields.
    pub position: String,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenFields {
    /// Splits a FEN string. Missing counters default to `0 1`.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();

        if !(4..=6).contains(&parts.len()) {
            return Err(FenError::InvalidPartCount(parts.len()));
        }
        if parts[1] != "w" && parts[1] != "b" {
            return Err(FenError::InvalidActiveColor(parts[1].to_string()));
        }

        let halfmove_clock = match parts.get(4) {
            Some(s) => s
                .parse()
                .map_err(|_| FenError::InvalidHalfmoveClock(s.to_string()))?,
            None => 0,
        };
        let fullmove_number = match parts.get(5) {
            Some(s) => match s.parse() {
                Ok(n) if n > 0 => n,
                _ => return Err(FenError::InvalidFullmoveNumber(s.to_string())),
            },
            None => 1,
        };

        Ok(Self {
            position: parts[..4].join(" "),
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Full six-field FEN.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.position, self.halfmove_clock, self.fullmove_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_startpos() {
        let fields = FenFields::parse(STARTPOS).unwrap();
        assert_eq!(fields.position, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -");
        assert_eq!(fields.halfmove_clock, 0);
        assert_eq!(fields.fullmove_number, 1);
        assert_eq!(fields.to_fen(), STARTPOS);
    }

    #[test]
    fn missing_counters_default() {
        let fields = FenFields::parse("7k/1R6/5N2/8/8/8/8/7K w - -").unwrap();
        assert_eq!(fields.to_fen(), "7k/1R6/5N2/8/8/8/8/7K w - - 0 1");
    }

    #[test]
    fn rejects_bad_fields() {
        assert_eq!(
            FenFields::parse("8/8/8/8 w"),
            Err(FenError::InvalidPartCount(2))
        );
        assert_eq!(
            FenFields::parse("8/8/8/8/8/8/8/K6k x - - 0 1"),
            Err(FenError::InvalidActiveColor("x".to_string()))
        );
        assert_eq!(
            FenFields::parse("8/8/8/8/8/8/8/K6k w - - z 1"),
            Err(FenError::InvalidHalfmoveClock("z".to_string()))
        );
        assert_eq!(
            FenFields::parse("8/8/8/8/8/8/8/K6k w - - 0 0"),
            Err(FenError::InvalidFullmoveNumber("0".to_string()))
        );
    }
}
