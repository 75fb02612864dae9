//! PGN (Portable Game Notation) import.
//!
//! Reads the first game of a PGN file with `pgn-reader`: tag pairs and
//! main-line movetext. Comments, variations and NAGs are skipped. Every
//! move is replayed so the returned list is known legal.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use thiserror::Error;

use crate::fen::STARTPOS;
use crate::{Board, BoardError, PlayedMove};

/// Errors that can occur when importing PGN text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PgnError {
    /// The reader gave up on the input.
    #[error("malformed PGN: {0}")]
    Malformed(String),
    /// The text contains no moves at all.
    #[error("PGN contains no moves")]
    NoMoves,
    /// The `FEN` tag could not be set up.
    #[error("invalid FEN tag: {0}")]
    InvalidSetup(#[source] BoardError),
    /// A movetext token is not a legal move in its position.
    #[error("move {ply} ({token}) could not be played: {source}")]
    IllegalMove {
        ply: usize,
        token: String,
        #[source]
        source: BoardError,
    },
}

/// A game read from PGN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnGame {
    /// Tag pairs in file order.
    pub tags: Vec<(String, String)>,
    /// Starting position, from the `FEN` tag or the standard one.
    pub initial_fen: String,
    /// Main-line moves, replayed and legal.
    pub moves: Vec<PlayedMove>,
}

impl PgnGame {
    /// Value of a tag, if present.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses the first game in `text`.
///
/// # Errors
///
/// - [`PgnError::NoMoves`] when no movetext is found
/// - [`PgnError::InvalidSetup`] for an unusable `FEN` tag
/// - [`PgnError::IllegalMove`] for the first move that cannot be played
pub fn parse_pgn(text: &str) -> Result<PgnGame, PgnError> {
    let mut reader = Reader::new(text.trim_start_matches('\u{feff}').as_bytes());
    match reader.read_game(&mut GameCollector) {
        Ok(Some(game)) => game,
        Ok(None) => Err(PgnError::NoMoves),
        Err(e) => Err(PgnError::Malformed(e.to_string())),
    }
}

/// Main line collected so far.
struct Mainline {
    tags: Vec<(String, String)>,
    initial_fen: String,
    board: Board,
    moves: Vec<PlayedMove>,
}

struct GameCollector;

impl Visitor for GameCollector {
    type Tags = Vec<(String, String)>;
    type Movetext = Mainline;
    type Output = Result<PgnGame, PgnError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let fen = tags
            .iter()
            .find(|(k, _)| k == "FEN")
            .map_or(STARTPOS, |(_, v)| v.as_str());
        match Board::from_fen(fen) {
            Ok(board) => ControlFlow::Continue(Mainline {
                initial_fen: board.fen(),
                board,
                moves: Vec::new(),
                tags,
            }),
            Err(e) => ControlFlow::Break(Err(PgnError::InvalidSetup(e))),
        }
    }

    fn san(&mut self, line: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let token = san_plus.to_string();
        match line.board.play_parsed_san(&san_plus.san, &token) {
            Ok(played) => {
                line.moves.push(played);
                ControlFlow::Continue(())
            }
            Err(source) => ControlFlow::Break(Err(PgnError::IllegalMove {
                ply: line.moves.len() + 1,
                token,
                source,
            })),
        }
    }

    fn begin_variation(&mut self, _line: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, line: Self::Movetext) -> Self::Output {
        if line.moves.is_empty() {
            return Err(PgnError::NoMoves);
        }
        Ok(PgnGame {
            tags: line.tags,
            initial_fen: line.initial_fen,
            moves: line.moves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERA: &str = r#"[Event "Paris"]
[White "Paul Morphy"]
[Black "Duke Karl / Count Isouard"]
[Result "1-0"]

1. e4 e5 2. Nf3 d6 3. d4 Bg4 {This is a weak move already.} 4. dxe5 Bxf3
5. Qxf3 dxe5 6. Bc4 Nf6 7. Qb3 Qe7 8. Nc3 c6 9. Bg5 b5 10. Nxb5 cxb5
11. Bxb5+ Nbd7 12. O-O-O Rd8 13. Rxd7 Rxd7 14. Rd1 Qe6 15. Bxd7+ Nxd7
16. Qb8+ Nxb8 17. Rd8# 1-0
"#;

    #[test]
    fn reads_tags_and_first_moves() {
        let game = parse_pgn("[White \"A\"]\n[Black \"B\"]\n\n1. e4 e5 2. Nf3 *").unwrap();
        assert_eq!(game.tag("White"), Some("A"));
        assert_eq!(game.tag("Black"), Some("B"));
        assert_eq!(game.tag("Result"), None);
        assert_eq!(game.initial_fen, STARTPOS);
        let uci: Vec<&str> = game.moves.iter().map(|m| m.uci.as_str()).collect();
        assert_eq!(uci, vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(game.moves[2].san, "Nf3");
    }

    #[test]
    fn bad_token_in_opera_game() {
        let err = parse_pgn(&OPERA.replace("4. dxe5", "4. dxe4")).unwrap_err();
        assert!(matches!(err, PgnError::IllegalMove { ply: 7, ref token, .. } if token == "dxe4"));
    }

    #[test]
    fn full_opera_game() {
        let game = parse_pgn(OPERA).unwrap();
        assert_eq!(game.moves.len(), 33);
        assert_eq!(game.moves.last().unwrap().san, "Rd8#");
        assert_eq!(game.tag("Result"), Some("1-0"));
    }

    #[test]
    fn skips_comments_variations_and_nags() {
        let text = "1. e4 $1 {best by test} (1. d4 d5 (1... Nf6 {indian}) 2. c4) 1... c5 ; sicilian\n2. Nf3 $14 2... d6 1/2-1/2";
        let game = parse_pgn(text).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "c5", "Nf3", "d6"]);
    }

    #[test]
    fn only_first_game_is_read() {
        let text = "[Event \"1\"]\n1. e4 e5 1-0\n\n[Event \"2\"]\n1. d4 d5 0-1\n";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.tag("Event"), Some("1"));
    }

    #[test]
    fn fen_tag_sets_start() {
        let text = "[SetUp \"1\"]\n[FEN \"7k/1R6/5N2/8/8/8/8/7K w - - 0 1\"]\n\n1. Rh7# 1-0";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.initial_fen, "7k/1R6/5N2/8/8/8/8/7K w - - 0 1");
        assert_eq!(game.moves[0].uci, "b7h7");
    }

    #[test]
    fn black_to_move_numbering() {
        let text = "[FEN \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1\"]\n1... e5 2. Nf3";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.moves[0].uci, "e7e5");
    }

    #[test]
    fn rejects_empty_and_unplayable() {
        assert_eq!(parse_pgn(""), Err(PgnError::NoMoves));
        assert_eq!(parse_pgn("   \n"), Err(PgnError::NoMoves));
        assert_eq!(parse_pgn("[Event \"x\"]\n\n*"), Err(PgnError::NoMoves));
        assert!(parse_pgn("hello world").is_err());
        assert!(matches!(
            parse_pgn("1. e4 e5 2. Ke3"),
            Err(PgnError::IllegalMove { ply: 3, .. })
        ));
    }

    #[test]
    fn rejects_bad_fen_tag() {
        assert!(matches!(
            parse_pgn("[FEN \"garbage\"]\n1. e4"),
            Err(PgnError::InvalidSetup(_))
        ));
        assert!(matches!(
            parse_pgn("[FEN \"8/8/8/8/8/8/8/8 w - - 0 1\"]\n1. e4"),
            Err(PgnError::InvalidSetup(_))
        ));
    }
}
