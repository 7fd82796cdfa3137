pub mod model_based;
pub mod q_learning;
pub mod value_iteration;

pub use model_based::ModelBasedSolver;
pub use q_learning::{QLearningAgent, QLearningConfig};
pub use value_iteration::ValueIteration;
