//! Game review on top of a UCI analysis engine.
//!
//! # Overview
//!
//! - [`EngineClient`] - Owned handle to one engine process, one search at a time
//! - [`bootstrap::launch`] - Starts an engine from an ordered list of sources
//! - [`Evaluation`] - Engine score (centipawn or mate) and the shared score scale
//! - [`Classification`] - Move quality label derived from win-percentage loss
//! - [`GameAnalyzer`] - Sequential whole-game analysis producing a [`GameReview`]
//! - [`ReviewNavigator`] - Cursor over a finished review
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{bootstrap, EngineConfig, GameAnalyzer};
//!
//! let config = EngineConfig::default();
//! let engine = bootstrap::launch(
//!     &config.providers(),
//!     &config.retry_policy(),
//!     &config.engine_options(),
//!     config.bootstrap_timeout(),
//! )
//! .await?;
//! let analyzer = GameAnalyzer::new(engine, 13);
//! let review = analyzer.analyze(&game, |p| println!("{}%", p.percent)).await?;
//! println!("White accuracy: {:.1}%", review.white_stats().accuracy);
//! ```

pub mod analyzer;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod evaluation;
pub mod navigator;
pub mod quality;
pub mod review;

pub use analyzer::{AnalysisProgress, AnalyzerError, GameAnalyzer};
pub use bootstrap::{EngineProvider, ProcessProvider, RetryPolicy};
pub use config::{EngineConfig, EngineSource, DEFAULT_DEPTH};
pub use engine::{
    AnalysisSample, EngineClient, EngineError, EngineOptions, EngineTransport, PositionEvaluator,
};
pub use evaluation::{eval_bar_percent, format_score, win_percent, Evaluation};
pub use navigator::{LastMove, NavigationError, ReviewFrame, ReviewNavigator};
pub use quality::{
    classify, judge_move, move_accuracy, rating_estimate, Classification,
    ClassificationCounts, MoveJudgement, SideStats,
};
pub use review::{GameInfo, GameReview, MoveRecord, ReviewError};
