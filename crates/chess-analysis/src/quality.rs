//! Move quality classification and per-side aggregation.

use std::collections::BTreeMap;

use chess_core::Color;
use serde::{Deserialize, Serialize};

use crate::evaluation::win_percent;

/// Win-percentage loss thresholds, inclusive upper bounds.
const EXCELLENT_MAX_LOSS: f64 = 2.0;
const GOOD_MAX_LOSS: f64 = 8.0;
const INACCURACY_MAX_LOSS: f64 = 15.0;
const MISTAKE_MAX_LOSS: f64 = 25.0;

/// Rating floor of the accuracy-to-rating curve.
pub const MIN_RATING: u32 = 200;

/// Qualitative label for a played move.
///
/// Variants are declared from best to worst among the score-based labels,
/// so `Ord` ranks EXCELLENT < GOOD < INACCURACY < MISTAKE < BLUNDER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Reserved: sacrifice recognition is not computed.
    Brilliant,
    /// Reserved: only-move detection is not computed.
    Great,
    /// The move the engine recommended
    Best,
    /// Win-percentage loss of at most 2
    Excellent,
    /// Loss of at most 8
    Good,
    /// Reserved: opening-book detection is not computed.
    Book,
    /// Loss of at most 15
    Inaccuracy,
    /// Loss of at most 25
    Mistake,
    /// Reserved: missed-tactic detection is not computed.
    Miss,
    /// Loss above 25
    Blunder,
}

impl Classification {
    pub const ALL: [Classification; 10] = [
        Classification::Brilliant,
        Classification::Great,
        Classification::Best,
        Classification::Excellent,
        Classification::Good,
        Classification::Book,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Miss,
        Classification::Blunder,
    ];

    /// Upper-case label, as serialized.
    pub fn label(self) -> &'static str {
        match self {
            Classification::Brilliant => "BRILLIANT",
            Classification::Great => "GREAT",
            Classification::Best => "BEST",
            Classification::Excellent => "EXCELLENT",
            Classification::Good => "GOOD",
            Classification::Book => "BOOK",
            Classification::Inaccuracy => "INACCURACY",
            Classification::Mistake => "MISTAKE",
            Classification::Miss => "MISS",
            Classification::Blunder => "BLUNDER",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification plus the numbers it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveJudgement {
    pub classification: Classification,
    /// Per-move accuracy, 0-100.
    pub accuracy: f64,
    /// Win-percentage lost by the mover, never negative.
    pub loss: f64,
}

/// Win-percentage of a white-perspective score, seen by `side`.
fn mover_win_percent(white_cp: i32, side: Color) -> f64 {
    match side {
        Color::White => win_percent(white_cp),
        Color::Black => win_percent(white_cp.saturating_neg()),
    }
}

/// Win-percentage lost by `side` going from `prev` to `curr`.
///
/// Both scores are white-perspective.
pub fn win_percent_loss(prev: i32, curr: i32, side: Color) -> f64 {
    let before = mover_win_percent(prev, side);
    let after = mover_win_percent(curr, side);
    (before - after).max(0.0)
}

/// Classifies a move from the scores around it.
///
/// `was_engine_best` wins over any score delta.
pub fn classify(prev: i32, curr: i32, side: Color, was_engine_best: bool) -> Classification {
    if was_engine_best {
        return Classification::Best;
    }
    classify_loss(win_percent_loss(prev, curr, side))
}

/// Maps a win-percentage loss onto the fixed thresholds.
pub fn classify_loss(loss: f64) -> Classification {
    if loss <= EXCELLENT_MAX_LOSS {
        Classification::Excellent
    } else if loss <= GOOD_MAX_LOSS {
        Classification::Good
    } else if loss <= INACCURACY_MAX_LOSS {
        Classification::Inaccuracy
    } else if loss <= MISTAKE_MAX_LOSS {
        Classification::Mistake
    } else {
        Classification::Blunder
    }
}

/// Per-move accuracy, `max(0, 100 - 2 * (ideal - after))`.
///
/// With no evaluation of the best alternative, the ideal win percentage is
/// taken as `max(before, after)`. Changing this shifts every accuracy and
/// rating number downstream.
pub fn move_accuracy(prev: i32, curr: i32, side: Color) -> f64 {
    let before = mover_win_percent(prev, side);
    let after = mover_win_percent(curr, side);
    let ideal = before.max(after);
    (100.0 - 2.0 * (ideal - after).max(0.0)).max(0.0)
}

/// Classification and accuracy in one call.
pub fn judge_move(prev: i32, curr: i32, side: Color, was_engine_best: bool) -> MoveJudgement {
    MoveJudgement {
        classification: classify(prev, curr, side, was_engine_best),
        accuracy: move_accuracy(prev, curr, side),
        loss: win_percent_loss(prev, curr, side),
    }
}

/// Count per classification, with every label present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationCounts(BTreeMap<Classification, u32>);

impl Default for ClassificationCounts {
    fn default() -> Self {
        Self(Classification::ALL.iter().map(|c| (*c, 0)).collect())
    }
}

impl ClassificationCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, classification: Classification) {
        *self.0.entry(classification).or_insert(0) += 1;
    }

    pub fn get(&self, classification: Classification) -> u32 {
        self.0.get(&classification).copied().unwrap_or(0)
    }

    /// Number of moves counted.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Classification, u32)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }
}

impl FromIterator<Classification> for ClassificationCounts {
    fn from_iter<I: IntoIterator<Item = Classification>>(iter: I) -> Self {
        let mut counts = Self::new();
        for c in iter {
            counts.increment(c);
        }
        counts
    }
}

/// Summary statistics for one side of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    /// Mean per-move accuracy, 0 when the side made no moves.
    pub accuracy: f64,
    pub counts: ClassificationCounts,
    pub rating_estimate: u32,
}

impl Default for SideStats {
    fn default() -> Self {
        fold(&[], ClassificationCounts::new())
    }
}

/// Folds per-move accuracies and counts into side statistics.
pub fn fold(accuracies: &[f64], counts: ClassificationCounts) -> SideStats {
    let accuracy = if accuracies.is_empty() {
        0.0
    } else {
        accuracies.iter().sum::<f64>() / accuracies.len() as f64
    };
    SideStats {
        accuracy,
        counts,
        rating_estimate: rating_estimate(accuracy),
    }
}

/// Piecewise accuracy-to-rating curve.
///
/// - below 20: 200
/// - 20 to 50: `400 + accuracy * 10`
/// - 50 and above: `600 + accuracy^1.65 / 10`
///
/// Never below [`MIN_RATING`].
pub fn rating_estimate(accuracy: f64) -> u32 {
    let rating = if accuracy < 20.0 {
        f64::from(MIN_RATING)
    } else if accuracy < 50.0 {
        400.0 + accuracy * 10.0
    } else {
        600.0 + accuracy.powf(1.65) / 10.0
    };
    (rating.round() as u32).max(MIN_RATING)
}
