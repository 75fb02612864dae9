//! Search progress reported on `info` lines.

use std::fmt::Write;
use std::str::SplitWhitespace;

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance.
///
/// Always relative to the side to move in the searched position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawns (100 = one pawn).
    Cp(i32),
    /// Mate in N moves. Positive when the side to move mates, zero or
    /// negative when it is mated.
    Mate(i32),
}

/// Marks a score as a search-window bound rather than an exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// One `info` line.
///
/// Only the fields a position evaluation needs are kept; `currmove`,
/// `hashfull`, `tbhits` and similar progress chatter are skipped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    /// Line index when the engine searches several principal variations.
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    /// Set when `score` is only a bound.
    pub bound: Option<Bound>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    /// Milliseconds searched.
    pub time: Option<u64>,
    /// Principal variation in long algebraic notation.
    pub pv: Vec<String>,
    /// Free text from `info string`.
    pub string: Option<String>,
}

impl EngineInfo {
    /// Exact score, or `None` if the line carries no score or only a bound.
    pub fn exact_score(&self) -> Option<Score> {
        self.score.filter(|_| self.bound.is_none())
    }

    /// Parses an `info` line. Returns `None` for any other line.
    ///
    /// A garbled value only loses its own field.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::default();
        let mut pending = tokens.next();
        while let Some(token) = pending {
            pending = tokens.next();
            match token {
                "depth" => info.depth = number(&mut pending, &mut tokens),
                "seldepth" => info.seldepth = number(&mut pending, &mut tokens),
                "multipv" => info.multipv = number(&mut pending, &mut tokens),
                "nodes" => info.nodes = number(&mut pending, &mut tokens),
                "nps" => info.nps = number(&mut pending, &mut tokens),
                "time" => info.time = number(&mut pending, &mut tokens),
                "score" => {
                    let kind = pending;
                    pending = tokens.next();
                    let value: Option<i32> = number(&mut pending, &mut tokens);
                    info.score = match (kind, value) {
                        (Some("cp"), Some(cp)) => Some(Score::Cp(cp)),
                        (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                        _ => None,
                    };
                }
                "lowerbound" => info.bound = Some(Bound::Lower),
                "upperbound" => info.bound = Some(Bound::Upper),
                "pv" => {
                    while let Some(mv) = pending.filter(|t| !is_keyword(t)) {
                        info.pv.push(mv.to_string());
                        pending = tokens.next();
                    }
                }
                "string" => {
                    let rest: Vec<&str> = pending.into_iter().chain(tokens.by_ref()).collect();
                    info.string = Some(rest.join(" "));
                    break;
                }
                _ => {}
            }
        }

        Some(info)
    }

    /// Formats the line as an engine would print it.
    pub fn to_uci(&self) -> String {
        let mut out = String::from("info");
        let numbers = [
            ("depth", self.depth.map(u64::from)),
            ("seldepth", self.seldepth.map(u64::from)),
            ("multipv", self.multipv.map(u64::from)),
        ];
        for (key, value) in numbers {
            if let Some(v) = value {
                let _ = write!(out, " {key} {v}");
            }
        }
        match self.score {
            Some(Score::Cp(cp)) => {
                let _ = write!(out, " score cp {cp}");
            }
            Some(Score::Mate(n)) => {
                let _ = write!(out, " score mate {n}");
            }
            None => {}
        }
        match self.bound {
            Some(Bound::Lower) => out.push_str(" lowerbound"),
            Some(Bound::Upper) => out.push_str(" upperbound"),
            None => {}
        }
        for (key, value) in [("nodes", self.nodes), ("nps", self.nps), ("time", self.time)] {
            if let Some(v) = value {
                let _ = write!(out, " {key} {v}");
            }
        }
        if !self.pv.is_empty() {
            let _ = write!(out, " pv {}", self.pv.join(" "));
        }
        if let Some(s) = &self.string {
            let _ = write!(out, " string {s}");
        }
        out
    }
}

/// Consumes the value token held in `pending`.
fn number<'a, T: std::str::FromStr>(
    pending: &mut Option<&'a str>,
    tokens: &mut SplitWhitespace<'a>,
) -> Option<T> {
    let value = pending.and_then(|t| t.parse().ok());
    *pending = tokens.next();
    value
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "sbhits"
            | "cpuload"
            | "refutation"
            | "currline"
            | "string"
    )
}

/// Assembles [`EngineInfo`] values for scripted engines.
#[derive(Debug, Default)]
pub struct InfoBuilder {
    info: EngineInfo,
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.info.depth = Some(depth);
        self
    }

    pub fn multipv(mut self, line: u32) -> Self {
        self.info.multipv = Some(line);
        self
    }

    pub fn score_cp(mut self, cp: i32) -> Self {
        self.info.score = Some(Score::Cp(cp));
        self
    }

    pub fn score_mate(mut self, moves: i32) -> Self {
        self.info.score = Some(Score::Mate(moves));
        self
    }

    pub fn bound(mut self, bound: Bound) -> Self {
        self.info.bound = Some(bound);
        self
    }

    pub fn pv<S: Into<String>>(mut self, moves: impl IntoIterator<Item = S>) -> Self {
        self.info.pv = moves.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> EngineInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stockfish_line() {
        let line = "info depth 12 seldepth 17 multipv 1 score cp 30 nodes 125000 nps 500000 hashfull 4 tbhits 0 time 250 pv e2e4 e7e5 g1f3";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.depth, Some(12));
        assert_eq!(info.seldepth, Some(17));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.exact_score(), Some(Score::Cp(30)));
        assert_eq!(info.nodes, Some(125000));
        assert_eq!(info.time, Some(250));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn pv_stops_at_next_keyword() {
        let info = EngineInfo::parse("info pv e2e4 e7e5 currmove g1f3 depth 4").unwrap();
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(info.depth, Some(4));
    }

    #[test]
    fn mate_scores() {
        let info = EngineInfo::parse("info depth 20 score mate -3 pv e2e4").unwrap();
        assert_eq!(info.score, Some(Score::Mate(-3)));
        let info = EngineInfo::parse("info depth 0 score mate 0").unwrap();
        assert_eq!(info.score, Some(Score::Mate(0)));
    }

    #[test]
    fn bound_scores_are_not_exact() {
        let info =
            EngineInfo::parse("info depth 18 score cp 41 lowerbound nodes 9000 pv d2d4").unwrap();
        assert_eq!(info.score, Some(Score::Cp(41)));
        assert_eq!(info.bound, Some(Bound::Lower));
        assert_eq!(info.exact_score(), None);
        assert_eq!(info.nodes, Some(9000));
    }

    #[test]
    fn garbled_fields_are_skipped() {
        let info = EngineInfo::parse("info depth x score cp ?? pv").unwrap();
        assert_eq!(info.depth, None);
        assert_eq!(info.score, None);
        assert!(info.pv.is_empty());

        let info = EngineInfo::parse("info score").unwrap();
        assert_eq!(info.score, None);
    }

    #[test]
    fn string_consumes_rest() {
        let info = EngineInfo::parse("info string NNUE evaluation using nn.nnue enabled").unwrap();
        assert_eq!(info.string.as_deref(), Some("NNUE evaluation using nn.nnue enabled"));
    }

    #[test]
    fn built_lines_parse_back() {
        let info = InfoBuilder::new()
            .depth(9)
            .multipv(1)
            .score_cp(-35)
            .bound(Bound::Upper)
            .pv(["e7e5", "g1f3"])
            .build();
        let line = info.to_uci();
        assert_eq!(line, "info depth 9 multipv 1 score cp -35 upperbound pv e7e5 g1f3");
        assert_eq!(EngineInfo::parse(&line), Some(info));
    }

    #[test]
    fn other_lines() {
        assert!(EngineInfo::parse("bestmove e2e4").is_none());
        assert!(EngineInfo::parse("infos depth 3").is_none());
    }
}
