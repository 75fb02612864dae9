//! Configuration file loading for the review tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chess_analysis::{EngineConfig, DEFAULT_DEPTH};
use chess_puzzles::{CatalogError, PuzzleCatalog, DEFAULT_REPLY_DELAY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Puzzle trainer settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PuzzleConfig {
    /// Pause before the opponent's scripted reply.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    /// JSON catalog to use instead of the built-in puzzles.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

fn default_reply_delay_ms() -> u64 {
    DEFAULT_REPLY_DELAY.as_millis() as u64
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
            catalog: None,
        }
    }
}

impl PuzzleConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn catalog(&self) -> Result<PuzzleCatalog, CatalogError> {
        match &self.catalog {
            Some(path) => PuzzleCatalog::load(path),
            None => Ok(PuzzleCatalog::builtin()),
        }
    }
}

/// Main configuration, read from `review.toml` by default.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReviewConfig {
    /// Search depth for every analyzed position.
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub puzzles: PuzzleConfig,
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            engine: EngineConfig::default(),
            puzzles: PuzzleConfig::default(),
        }
    }
}

impl ReviewConfig {
    /// Loads the configuration at `path`, or the defaults if there is no
    /// such file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }
}
