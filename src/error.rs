//! Error types for the gridmdp crate

use thiserror::Error;

/// Main error type for the gridmdp crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid grid dimensions {width}x{height}: both must be at least 1")]
    InvalidDimensions { width: usize, height: usize },

    #[error("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    CellOutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("cell ({x}, {y}) is listed more than once")]
    DuplicateCell { x: usize, y: usize },

    #[error("open cell ({x}, {y}) has no path to a terminal cell")]
    NoReachableTerminal { x: usize, y: usize },

    #[error("invalid probability `{name}` = {value}: must be in [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("invalid discount {0}: must be in (0, 1]")]
    InvalidDiscount(f64),

    #[error("invalid decay schedule: {0}")]
    InvalidDecay(String),

    #[error("grid shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Wrap an I/O error with a short description of what was being attempted
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
