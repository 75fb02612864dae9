//! Built-in puzzle data.
//!
//! Classic mating patterns, each a short forced line from a known game or
//! textbook position.

use crate::puzzle::PuzzleDefinition;

fn puzzle(
    id: &str,
    title: &str,
    description: &str,
    rating: u32,
    theme: &str,
    fen: &str,
    solution: &[&str],
) -> PuzzleDefinition {
    PuzzleDefinition {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        rating,
        theme: theme.to_string(),
        fen: fen.to_string(),
        solution: solution.iter().map(|m| m.to_string()).collect(),
    }
}

/// The built-in puzzle set, in catalog order.
#[must_use]
pub fn builtin_puzzles() -> Vec<PuzzleDefinition> {
    vec![
        puzzle(
            "1",
            "The Opera Game",
            "Paul Morphy vs. Duke of Brunswick (1858). The most famous checkmate in history.",
            1500,
            "Queen Sacrifice",
            "4kb1r/p2n1ppp/4q3/4p1B1/4P3/1Q6/PPP2PPP/2KR4 w k - 1 22",
            &["b3b8", "d7b8", "d1d8"],
        ),
        puzzle(
            "2",
            "Philidor's Legacy",
            "The classic Smothered Mate. The Queen sacrifices herself to trap the King.",
            1450,
            "Smothered Mate",
            "r1bq1r1k/pp4pp/2p4N/2b1p3/2Q1P3/2P5/PP3PPP/3R1RK1 w - - 0 1",
            &["c4g8", "f8g8", "h6f7"],
        ),
        puzzle(
            "3",
            "Boden's Mate",
            "Schulder vs. Boden (1853). The two bishops criss-cross to deliver mate.",
            1300,
            "Mating Pattern",
            "2kr1b1r/pp1n1ppp/2p1b3/4P3/2B2B2/2n2Q2/PPP2PPP/2KR3R w - - 1 13",
            &["f3c6", "b7c6", "c4a6"],
        ),
        puzzle(
            "4",
            "Legal's Mate",
            "De Legal vs. Saint Brie (1750). A classic opening trap involving a Queen sacrifice.",
            1200,
            "Opening Trap",
            "r2qkb1r/pp1n1ppp/2p5/4p3/2B1P1b1/2N2N2/PPP2PPP/R1BQK2R w KQkq - 1 8",
            &["f3e5", "g4d1", "c4f7", "e8e7", "c3d5"],
        ),
        puzzle(
            "5",
            "Anastasia's Mate",
            "The Knight and Rook coordinate to deliver a beautiful mate.",
            1300,
            "Mating Pattern",
            "5r1k/1p2Nppp/8/7Q/8/8/5PPP/3R2K1 w - - 0 1",
            &["h5h7", "h8h7", "d1d3", "g7g6", "d3h3"],
        ),
        puzzle(
            "6",
            "The Hook Mate",
            "The rook is protected by a knight, creating a hook that the king cannot escape.",
            1350,
            "Pattern Recognition",
            "3rkn2/R7/8/5N2/6P1/8/8/7K w - - 0 1",
            &["a7e7"],
        ),
        puzzle(
            "7",
            "Arabian Mate",
            "One of the oldest known checkmates (9th Century), using Knight and Rook.",
            1100,
            "Endgame Tactic",
            "7k/1R6/5N2/8/8/8/8/7K w - - 0 1",
            &["b7h7"],
        ),
        puzzle(
            "8",
            "The Windmill",
            "Torre vs. Lasker (1925). A series of discovered checks that devastates Black.",
            1600,
            "Mating Pattern",
            "2r2rk1/pp3ppp/2n5/4N3/2B5/2n5/PPP2PPP/2KR3R w - - 0 1",
            &["e5f7", "f8f7", "d1d8"],
        ),
        puzzle(
            "9",
            "Greco's Mate",
            "A bishop sacrifices itself to open the h-file for the rook.",
            1400,
            "File Opening",
            "r1b3k1/pp3ppp/2p5/8/2B1r3/8/PPP2PPP/3R1K1R w - - 0 1",
            &["d1d8", "e4e8", "d8e8"],
        ),
        puzzle(
            "10",
            "Damiano's Mate",
            "A classic method of attacking the castled King.",
            1350,
            "King Hunt",
            "6k1/5p1p/8/6r1/8/5p2/7P/7K b - - 0 1",
            &["g5g1", "h1g1", "f3f2"],
        ),
        puzzle(
            "11",
            "Lolli's Mate",
            "A pawn on f6 (or f3) creates a deadly mating net.",
            1400,
            "Mating Pattern",
            "6k1/5p2/5PpQ/8/8/8/8/7K w - - 0 1",
            &["h6g7"],
        ),
        puzzle(
            "12",
            "Back Rank Mate",
            "A fundamental pattern every beginner must master.",
            800,
            "Basic Checkmate",
            "3r2k1/p4ppp/2p5/8/4q3/8/PPP2PPP/3Q2K1 w - - 0 1",
            &["d1d8", "e4e8", "d8e8"],
        ),
        puzzle(
            "13",
            "The Immortal Game",
            "Anderssen vs. Kieseritzky (1851). A sacrifice-filled finish for the ages.",
            1600,
            "Historical Masterpiece",
            "r1bk2nr/p2p1pNp/n2B4/1p1NP2P/6P1/3P1Q2/P1P1K3/q5b1 w - - 0 18",
            &["f3f6", "g8f6", "d6e7"],
        ),
        puzzle(
            "14",
            "Rook Lift Mate",
            "Lifting the rook to the 3rd or 4th rank to join the attack.",
            1150,
            "Attacking Pattern",
            "5rk1/5p1p/6p1/8/8/2B5/8/R6K w - - 0 1",
            &["a1g1"],
        ),
        puzzle(
            "15",
            "Scholar's Mate",
            "The infamous four-move checkmate that catches many beginners.",
            400,
            "Opening Trap",
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
            &["h5f7"],
        ),
        puzzle(
            "16",
            "Fool's Mate",
            "The quickest possible checkmate in chess.",
            300,
            "Opening Catastrophe",
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
            &["d8h4"],
        ),
        puzzle(
            "17",
            "Blind Swine Mate",
            "Two rooks on the 7th rank devour everything in their path.",
            1250,
            "Endgame Pattern",
            "1r5k/2RR4/8/8/8/8/8/7K w - - 0 1",
            &["d7h7", "h8g8", "c7g7"],
        ),
        puzzle(
            "18",
            "Epaulette Mate",
            "The King is boxed in by his own pieces on both sides.",
            1300,
            "Mating Pattern",
            "3rkr2/8/8/8/8/8/Q7/6K1 w - - 0 1",
            &["a2e6"],
        ),
        puzzle(
            "19",
            "Ladder Mate",
            "Two major pieces work together to push the King to the edge.",
            500,
            "Basic Checkmate",
            "k7/7R/1R6/8/8/8/8/7K w - - 0 1",
            &["h7a7"],
        ),
        puzzle(
            "20",
            "Anderssen's Mate",
            "A rook and a supporting pawn (or piece) deliver mate in the corner.",
            1100,
            "Mating Pattern",
            "6k1/6P1/5K2/8/8/8/8/7R w - - 0 1",
            &["h1h8"],
        ),
        puzzle(
            "21",
            "Caro-Kann Smother",
            "A famous 6-move checkmate in the Caro-Kann Defense.",
            1200,
            "Opening Trap",
            "r1bqkb1r/pp1npppp/2p2n2/8/3PN3/8/PPP1QPPP/R1B1KBNR w KQkq - 1 6",
            &["e4d6"],
        ),
    ]
}
