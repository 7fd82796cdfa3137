pub mod grid_walk;
pub mod grid_world;

pub use grid_walk::GridWalk;
pub use grid_world::{GridState, GridWorld};
