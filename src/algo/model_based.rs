use log::{debug, info};
use strum::VariantArray;

use crate::{
    error::Result,
    grid::{Convention, Grid, Heading, PolicyCell, Tile, Xy},
    instance::Instance,
};

/// Synchronous value iteration over a dense array world
///
/// Holds its own copy of the dynamics in the bottom-up [`Xy`] convention with
/// [`Heading`] labels. Each sweep recomputes every open cell as
///
/// V(x,y) = r + γ max<sub>a</sub> E[V | a]
///
/// from a snapshot of the previous sweep, and records the maximising heading as the
/// cell's policy. Terminal cells hold their reward from construction onwards.
#[derive(Debug, Clone)]
pub struct ModelBasedSolver {
    tiles: Grid<Tile>,
    slip: f64,
    step_reward: f64,
    discount: f64,
    value: Grid<f64>,
    policy: Grid<PolicyCell<Heading>>,
}

impl ModelBasedSolver {
    pub fn new(tiles: &Grid<Tile>, slip: f64, step_reward: f64, discount: f64) -> Self {
        let tiles = tiles.reoriented(Convention::BottomUp);
        let value = tiles.map(|tile| tile.terminal_reward().unwrap_or(0.0));
        let policy = tiles.map(|tile| match *tile {
            Tile::Open => PolicyCell::Unset,
            Tile::Terminal(reward) => PolicyCell::Terminal(reward),
            Tile::Wall => PolicyCell::Wall,
        });
        Self {
            tiles,
            slip,
            step_reward,
            discount,
            value,
            policy,
        }
    }

    /// Build the solver for a validated instance
    pub fn from_instance(instance: &Instance) -> Result<Self> {
        let tiles = instance.tiles()?;
        Ok(Self::new(
            &tiles,
            instance.slip,
            instance.step_reward,
            instance.discount,
        ))
    }

    pub fn is_terminal(&self, cell: Xy) -> bool {
        self.tiles[cell].terminal_reward().is_some()
    }

    /// Move one cell towards `heading`, clamping at the edges
    ///
    /// Walls are not checked here, see [`expected_value`](Self::expected_value).
    pub fn step(&self, cell: Xy, heading: Heading) -> Xy {
        let Xy { x, y } = cell;
        match heading {
            Heading::Up => Xy::new(x, (y + 1).min(self.tiles.height() - 1)),
            Heading::Down => Xy::new(x, y.saturating_sub(1)),
            Heading::Left => Xy::new(x.saturating_sub(1), y),
            Heading::Right => Xy::new((x + 1).min(self.tiles.width() - 1), y),
        }
    }

    /// Expected next value of aiming `heading` from `cell`, landing on a wall means staying put
    pub fn expected_value(&self, cell: Xy, heading: Heading) -> f64 {
        heading
            .slips(self.slip)
            .iter()
            .map(|&(actual, weight)| {
                let landing = self.step(cell, actual);
                let landing = if self.tiles[landing].is_wall() {
                    cell
                } else {
                    landing
                };
                weight * self.value[landing]
            })
            .sum()
    }

    /// Run a fixed number of synchronous sweeps
    ///
    /// Every sweep reads the previous sweep's values only, new values go into a copy
    /// that replaces the table once the sweep is complete.
    pub fn value_iteration(&mut self, iterations: u32) {
        let open: Vec<Xy> = self
            .tiles
            .iter()
            .filter(|(_, tile)| **tile == Tile::Open)
            .map(|((y, x), _)| Xy::new(x, y))
            .collect();

        for sweep in 0..iterations {
            let mut next = self.value.clone();
            for &cell in &open {
                let (best, max_value) = self.best_heading(cell);
                next[cell] = self.step_reward + self.discount * max_value;
                self.policy[cell] = PolicyCell::Move(best);
            }
            let change = self
                .value
                .cells()
                .iter()
                .zip(next.cells())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            debug!("model-based sweep {}: largest change {change:.6}", sweep + 1);
            self.value = next;
        }
        info!(
            "model-based value iteration finished {iterations} sweeps over {} open cells",
            open.len()
        );
    }

    /// First heading, in U D L R order, with the highest expected value
    fn best_heading(&self, cell: Xy) -> (Heading, f64) {
        let mut best = (Heading::Up, f64::NEG_INFINITY);
        for &heading in Heading::VARIANTS {
            let value = self.expected_value(cell, heading);
            if value > best.1 {
                best = (heading, value);
            }
        }
        best
    }

    /// Values in the bottom-up convention
    pub fn values(&self) -> &Grid<f64> {
        &self.value
    }

    /// Greedy headings in the bottom-up convention
    pub fn policy(&self) -> &Grid<PolicyCell<Heading>> {
        &self.policy
    }
}
