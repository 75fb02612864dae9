//! Position evaluation types and score scales.

use chess_core::Color;
use serde::{Deserialize, Serialize};

/// Centipawn value a mate-in-0 folds onto. Mate in N folds to `MATE_SCORE - N`.
pub const MATE_SCORE: i32 = 10_000;

/// Folded scores beyond this magnitude are displayed as mates.
pub const MATE_DISPLAY_THRESHOLD: i32 = 8_000;

/// Logistic steepness of the win-percentage curve.
const WIN_PCT_K: f64 = 0.004;

/// Engine evaluation as reported, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evaluation {
    /// Centipawn score (100 = 1 pawn advantage).
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, 0 or negative = gets mated).
    Mate(i32),
}

impl From<uci::Score> for Evaluation {
    fn from(score: uci::Score) -> Self {
        match score {
            uci::Score::Cp(cp) => Evaluation::Centipawns(cp),
            uci::Score::Mate(n) => Evaluation::Mate(n),
        }
    }
}

impl Evaluation {
    /// Folds the evaluation onto a single centipawn scale.
    ///
    /// `mate 0` means the side to move is already mated and folds to
    /// `-MATE_SCORE`.
    pub fn to_centipawns(self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => cp.clamp(-(MATE_SCORE - 1), MATE_SCORE - 1),
            Evaluation::Mate(n) if n > 0 => MATE_SCORE - n.min(MATE_SCORE),
            Evaluation::Mate(n) => -MATE_SCORE - n.max(-MATE_SCORE),
        }
    }

    /// Folded score from white's point of view.
    pub fn white_centipawns(self, side_to_move: Color) -> i32 {
        let cp = self.to_centipawns();
        match side_to_move {
            Color::White => cp,
            Color::Black => -cp,
        }
    }
}

/// Converts a score to a 0-100 win percentage for the side it favours.
///
/// `winPct(cp) = 50 + 50 * (2 / (1 + e^(-k*cp)) - 1)` with `k = 0.004`.
pub fn win_percent(cp: i32) -> f64 {
    50.0 + 50.0 * (2.0 / (1.0 + (-WIN_PCT_K * f64::from(cp)).exp()) - 1.0)
}

/// Display form of a folded white-perspective score: `+1.5`, `-0.3`, `M3`, `-M2`.
pub fn format_score(cp: i32) -> String {
    if cp.abs() > MATE_DISPLAY_THRESHOLD {
        let moves = MATE_SCORE - cp.abs();
        if cp > 0 {
            format!("M{}", moves)
        } else {
            format!("-M{}", moves)
        }
    } else if cp == 0 {
        "0.0".to_string()
    } else {
        format!("{:+.1}", f64::from(cp) / 100.0)
    }
}

/// White's share of an evaluation bar, 0-100.
///
/// Mate scores pin the bar; everything else is clamped to +-5 pawns.
pub fn eval_bar_percent(cp: i32) -> f64 {
    if cp > MATE_DISPLAY_THRESHOLD {
        return 100.0;
    }
    if cp < -MATE_DISPLAY_THRESHOLD {
        return 0.0;
    }
    let clamped = f64::from(cp.clamp(-500, 500));
    50.0 + clamped / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mate_folding() {
        assert_eq!(Evaluation::Mate(1).to_centipawns(), 9_999);
        assert_eq!(Evaluation::Mate(5).to_centipawns(), 9_995);
        assert_eq!(Evaluation::Mate(-3).to_centipawns(), -9_997);
        assert_eq!(Evaluation::Mate(0).to_centipawns(), -10_000);
        assert_eq!(Evaluation::Centipawns(35).to_centipawns(), 35);
    }

    #[test]
    fn normalized_to_white() {
        assert_eq!(Evaluation::Centipawns(120).white_centipawns(Color::White), 120);
        assert_eq!(Evaluation::Centipawns(120).white_centipawns(Color::Black), -120);
        // Black to move and mated
        assert_eq!(Evaluation::Mate(0).white_centipawns(Color::Black), 10_000);
        assert_eq!(Evaluation::Mate(2).white_centipawns(Color::Black), -9_998);
    }

    #[test]
    fn win_percent_reference_points() {
        assert_eq!(win_percent(0), 50.0);
        assert!((win_percent(100) - 59.87).abs() < 0.01);
        assert!((win_percent(-600) - 8.32).abs() < 0.01);
        assert!(win_percent(MATE_SCORE) > 99.99);
    }

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(0), "0.0");
        assert_eq!(format_score(150), "+1.5");
        assert_eq!(format_score(-34), "-0.3");
        assert_eq!(format_score(9_997), "M3");
        assert_eq!(format_score(-9_998), "-M2");
        assert_eq!(format_score(-10_000), "-M0");
    }

    #[test]
    fn eval_bar() {
        assert_eq!(eval_bar_percent(0), 50.0);
        assert_eq!(eval_bar_percent(250), 75.0);
        assert_eq!(eval_bar_percent(2_000), 100.0);
        assert_eq!(eval_bar_percent(-9_990), 0.0);
    }

    proptest! {
        #[test]
        fn win_percent_in_range(cp in any::<i32>()) {
            let w = win_percent(cp);
            prop_assert!((0.0..=100.0).contains(&w));
        }

        #[test]
        fn win_percent_strictly_increasing(a in -3_000i32..3_000, delta in 1i32..3_000) {
            prop_assert!(win_percent(a) < win_percent(a + delta));
        }

        #[test]
        fn win_percent_never_decreases(a in any::<i32>(), b in any::<i32>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(win_percent(lo) <= win_percent(hi));
        }

        #[test]
        fn win_percent_symmetric(cp in -10_000i32..10_000) {
            prop_assert!((win_percent(cp) + win_percent(-cp) - 100.0).abs() < 1e-9);
        }
    }
}
