use serde::{Deserialize, Serialize};

/// Side to move, or the side that made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Reads the active-color field of a FEN string.
    ///
    /// Anything other than `b` counts as white, matching how engines read
    /// a truncated position string.
    pub fn from_fen(fen: &str) -> Self {
        match fen.split_whitespace().nth(1) {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }
}

impl From<shakmaty::Color> for Color {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Color::White => "White",
            Color::Black => "Black",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn active_color_field() {
        assert_eq!(
            Color::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"),
            Color::Black
        );
        assert_eq!(Color::from_fen("8/8/8/8/8/8/8/K6k w - - 0 1"), Color::White);
        assert_eq!(Color::from_fen("8/8/8/8/8/8/8/K6k"), Color::White);
    }

    #[test]
    fn names() {
        assert_eq!(serde_json::to_string(&Color::Black).unwrap(), "\"black\"");
        assert_eq!(Color::White.to_string(), "White");
        assert_eq!(Color::from(shakmaty::Color::Black), Color::Black);
    }
}
