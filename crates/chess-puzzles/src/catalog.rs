//! Puzzle collections and lookup.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::Path;

use thiserror::Error;

use crate::builtin::builtin_puzzles;
use crate::puzzle::{PuzzleDefinition, PuzzleError};

/// Errors that can occur when loading a puzzle catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read the catalog file.
    #[error("failed to read puzzle catalog: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A puzzle failed validation.
    #[error(transparent)]
    Invalid(#[from] PuzzleError),

    #[error("duplicate puzzle id: {0}")]
    DuplicateId(String),
}

/// An ordered, validated set of puzzles.
#[derive(Debug, Clone, Default)]
pub struct PuzzleCatalog {
    puzzles: Vec<PuzzleDefinition>,
}

impl PuzzleCatalog {
    /// Builds a catalog, validating every puzzle line.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Invalid`] for the first puzzle whose line does not
    /// replay, [`CatalogError::DuplicateId`] for repeated ids.
    pub fn new(puzzles: Vec<PuzzleDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for puzzle in &puzzles {
            if !seen.insert(puzzle.id.as_str()) {
                return Err(CatalogError::DuplicateId(puzzle.id.clone()));
            }
            puzzle.validate()?;
        }
        Ok(Self { puzzles })
    }

    /// The built-in set.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            puzzles: builtin_puzzles(),
        }
    }

    /// Parses a JSON array of puzzles.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let puzzles: Vec<PuzzleDefinition> = serde_json::from_str(json)?;
        Self::new(puzzles)
    }

    /// Reads a JSON catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    #[must_use]
    pub fn all(&self) -> &[PuzzleDefinition] {
        &self.puzzles
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PuzzleDefinition> {
        self.puzzles.iter().find(|p| p.id == id)
    }

    /// The puzzle after `id`, wrapping to the first. Unknown ids also give
    /// the first puzzle.
    #[must_use]
    pub fn next_after(&self, id: &str) -> Option<&PuzzleDefinition> {
        let next = self
            .puzzles
            .iter()
            .position(|p| p.id == id)
            .map_or(0, |i| (i + 1) % self.puzzles.len());
        self.puzzles.get(next)
    }

    /// Puzzles whose theme matches, ignoring case.
    #[must_use]
    pub fn by_theme(&self, theme: &str) -> Vec<&PuzzleDefinition> {
        self.puzzles
            .iter()
            .filter(|p| p.theme.eq_ignore_ascii_case(theme))
            .collect()
    }

    #[must_use]
    pub fn in_rating_range(&self, range: RangeInclusive<u32>) -> Vec<&PuzzleDefinition> {
        self.puzzles
            .iter()
            .filter(|p| range.contains(&p.rating))
            .collect()
    }
}
