/// Exact, model-based and model-free solvers
pub mod algo;

/// Side-by-side runs of the three solvers
pub mod compare;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Planning models and sampled environments
pub mod env;

pub mod error;

/// Exploration policies
pub mod exploration;

/// Benchmark instance catalog
pub mod fixtures;

pub mod grid;

/// Grid world environments
pub mod gym;

/// Grid world descriptions and their JSON form
pub mod instance;

/// CSV reports of per-cell differences
pub mod report;

mod util;

pub use error::{Error, Result};
