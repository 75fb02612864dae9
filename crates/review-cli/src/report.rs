//! Plain-text rendering of reviews, frames and puzzles.

use std::fmt::Write;

use chess_analysis::{eval_bar_percent, format_score, Classification, GameReview, ReviewFrame};
use chess_core::Color;
use chess_puzzles::{PuzzleDefinition, PuzzleSessionState};

/// Per-side accuracy, rating and classification table.
pub fn summary(review: &GameReview) -> String {
    let info = review.info();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} vs {}  {}  (depth {})",
        info.white.as_deref().unwrap_or("White"),
        info.black.as_deref().unwrap_or("Black"),
        info.result.as_deref().unwrap_or("*"),
        review.depth()
    );
    let _ = writeln!(out, "{:<12}{:>10}{:>10}", "", "White", "Black");
    let white = review.white_stats();
    let black = review.black_stats();
    let _ = writeln!(
        out,
        "{:<12}{:>9.1}%{:>9.1}%",
        "Accuracy", white.accuracy, black.accuracy
    );
    let _ = writeln!(
        out,
        "{:<12}{:>10}{:>10}",
        "Rating", white.rating_estimate, black.rating_estimate
    );
    for c in Classification::ALL {
        let (w, b) = (white.counts.get(c), black.counts.get(c));
        if w + b > 0 {
            let _ = writeln!(out, "{:<12}{:>10}{:>10}", c.label(), w, b);
        }
    }
    out
}

/// One line per move: number, SAN, classification, score after.
pub fn move_list(review: &GameReview) -> String {
    let mut out = String::new();
    for (i, m) in review.moves().iter().enumerate() {
        let number = if m.side == Color::White {
            format!("{}.", i / 2 + 1)
        } else {
            format!("{}...", i / 2 + 1)
        };
        let _ = writeln!(
            out,
            "{:>6} {:<8} {:<11} {:>6}",
            number,
            m.san,
            m.classification.label(),
            format_score(review.evaluation_history()[i + 1])
        );
    }
    out
}

pub fn frame(frame: &ReviewFrame) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Position: {}", frame.fen);
    match &frame.last_move {
        Some(last) => {
            let _ = writeln!(
                out,
                "Move {}: {} ({}{}) {}",
                frame.cursor + 1,
                last.san,
                last.from,
                last.to,
                last.classification
            );
        }
        None => {
            let _ = writeln!(out, "Initial position");
        }
    }
    let _ = writeln!(
        out,
        "Evaluation: {} (white {:.0}%)",
        format_score(frame.evaluation),
        eval_bar_percent(frame.evaluation)
    );
    if let Some(best) = &frame.engine_best {
        let _ = writeln!(out, "Engine preferred: {best}");
    }
    let _ = writeln!(out, "{} to move", frame.side_to_move);
    out
}

pub fn puzzle_line(p: &PuzzleDefinition) -> String {
    format!("{:>3}  {:<22} {:>5}  {}", p.id, p.title, p.rating, p.theme)
}

pub fn puzzle_state(state: &PuzzleSessionState) -> String {
    let mut line = format!(
        "[{}] {} (moves solved: {})",
        state.status, state.fen, state.solved_move_count
    );
    if let Some(square) = &state.hint_square {
        let _ = write!(line, " hint: {square}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_puzzles::PuzzleCatalog;

    #[test]
    fn puzzle_listing() {
        let catalog = PuzzleCatalog::builtin();
        let line = puzzle_line(catalog.get("7").unwrap());
        assert!(line.contains("Arabian Mate"));
        assert!(line.contains("1100"));
    }
}
