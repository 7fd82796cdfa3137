use std::{
    collections::{HashSet, VecDeque},
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};
use strum::VariantArray;

use crate::{
    error::{Error, Result},
    grid::{Convention, Grid, Heading, Tile, Xy},
};

/// A special cell of an [`Instance`] in bottom-up coordinates
///
/// A reward of exactly `0` marks a wall, any other value a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub x: i64,
    pub y: i64,
    pub reward: f64,
}

impl CellSpec {
    pub fn new(x: i64, y: i64, reward: f64) -> Self {
        Self { x, y, reward }
    }

    pub fn is_wall(&self) -> bool {
        self.reward == 0.0
    }
}

/// Everything needed to build and solve one grid world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Label used in logs and reports
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Terminal cells and walls
    pub cells: Vec<CellSpec>,
    /// Probability of moving in the intended direction
    pub slip: f64,
    /// Reward for every transition out of a non-terminal cell
    pub step_reward: f64,
    /// **Default**: `0.5`
    #[serde(default = "default_discount")]
    pub discount: f64,
    /// Number of sweeps for the planning solvers
    ///
    /// **Default**: `100`
    #[serde(default = "default_sweeps")]
    pub sweeps: u32,
    /// Number of episodes for the learning solver
    ///
    /// **Default**: `10000`
    #[serde(default = "default_episodes")]
    pub episodes: u32,
}

fn default_discount() -> f64 {
    0.5
}

fn default_sweeps() -> u32 {
    100
}

fn default_episodes() -> u32 {
    10_000
}

impl Instance {
    /// Create an instance with default discount and budgets
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<CellSpec>,
        slip: f64,
        step_reward: f64,
    ) -> Self {
        Self {
            name: String::new(),
            width,
            height,
            cells,
            slip,
            step_reward,
            discount: default_discount(),
            sweeps: default_sweeps(),
            episodes: default_episodes(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_budget(mut self, sweeps: u32, episodes: u32) -> Self {
        self.sweeps = sweeps;
        self.episodes = episodes;
        self
    }

    /// The classic 4x3 world: a wall at (1, 1), +1 at (3, 2), -1 at (3, 1)
    pub fn classic(step_reward: f64) -> Self {
        Self::new(
            4,
            3,
            vec![
                CellSpec::new(1, 1, 0.0),
                CellSpec::new(3, 2, 1.0),
                CellSpec::new(3, 1, -1.0),
            ],
            0.8,
            step_reward,
        )
    }

    /// Check dimensions, probabilities and that every special cell is inside the grid
    ///
    /// Every open cell must also be connected to a terminal cell through open cells,
    /// otherwise an episode started there could never end.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..=1.0).contains(&self.slip) {
            return Err(Error::InvalidProbability {
                name: "slip",
                value: self.slip,
            });
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(Error::InvalidDiscount(self.discount));
        }

        let mut seen = HashSet::with_capacity(self.cells.len());
        for cell in &self.cells {
            let xy = self.locate(cell).ok_or(Error::CellOutOfBounds {
                x: cell.x,
                y: cell.y,
                width: self.width,
                height: self.height,
            })?;
            if !seen.insert(xy) {
                return Err(Error::DuplicateCell { x: xy.x, y: xy.y });
            }
        }

        match stranded_cell(&self.layout()) {
            Some(xy) => Err(Error::NoReachableTerminal { x: xy.x, y: xy.y }),
            None => Ok(()),
        }
    }

    /// The layout as a bottom-up grid of tiles, after validation
    pub fn tiles(&self) -> Result<Grid<Tile>> {
        self.validate()?;
        Ok(self.layout())
    }

    fn layout(&self) -> Grid<Tile> {
        let mut tiles = Grid::filled(self.width, self.height, Convention::BottomUp, Tile::Open);
        for cell in &self.cells {
            if let Some(xy) = self.locate(cell) {
                tiles[xy] = if cell.is_wall() {
                    Tile::Wall
                } else {
                    Tile::Terminal(cell.reward)
                };
            }
        }
        tiles
    }

    fn locate(&self, cell: &CellSpec) -> Option<Xy> {
        let in_bounds = cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height;
        in_bounds.then(|| Xy::new(cell.x as usize, cell.y as usize))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the instance as a JSON fixture
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .map_err(|e| Error::io(format!("write {}", path.display()), e))
    }

    /// Read an instance from a JSON fixture
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
        Self::from_json(&json)
    }
}

/// First open cell, in storage order, with no path of open cells to a terminal
fn stranded_cell(tiles: &Grid<Tile>) -> Option<Xy> {
    let mut reached = tiles.map(|tile| tile.terminal_reward().is_some());
    let mut queue: VecDeque<Xy> = tiles
        .iter()
        .filter(|(_, tile)| tile.terminal_reward().is_some())
        .map(|((y, x), _)| Xy::new(x, y))
        .collect();

    while let Some(cell) = queue.pop_front() {
        for heading in Heading::VARIANTS {
            let (dx, dy) = heading.offset();
            let (x, y) = (cell.x as isize + dx, cell.y as isize + dy);
            if !tiles.contains(x, y) {
                continue;
            }
            let next = Xy::new(x as usize, y as usize);
            if tiles[next] == Tile::Open && !reached[next] {
                reached[next] = true;
                queue.push_back(next);
            }
        }
    }

    tiles
        .iter()
        .find(|((y, x), tile)| **tile == Tile::Open && !reached[Xy::new(*x, *y)])
        .map(|((y, x), _)| Xy::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_layout() {
        let tiles = Instance::classic(-0.04).tiles().unwrap();
        assert_eq!(tiles.shape(), (4, 3));
        assert_eq!(tiles[Xy::new(1, 1)], Tile::Wall);
        assert_eq!(tiles[Xy::new(3, 2)], Tile::Terminal(1.0));
        assert_eq!(tiles[Xy::new(3, 1)], Tile::Terminal(-1.0));
        assert_eq!(tiles.cells().iter().filter(|t| **t == Tile::Open).count(), 9);
    }

    #[test]
    fn rejects_out_of_bounds_cell() {
        let mut instance = Instance::classic(-0.04);
        instance.cells.push(CellSpec::new(4, 0, 1.0));
        assert!(matches!(
            instance.validate(),
            Err(Error::CellOutOfBounds { x: 4, y: 0, .. })
        ));

        instance.cells.pop();
        instance.cells.push(CellSpec::new(0, -1, 1.0));
        assert!(instance.tiles().is_err(), "Negative coordinates are rejected");
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad_slip = Instance::classic(-0.04);
        let bad_slip = Instance { slip: 1.2, ..bad_slip };
        assert!(matches!(
            bad_slip.validate(),
            Err(Error::InvalidProbability { name: "slip", .. })
        ));

        let bad_discount = Instance::classic(-0.04).with_discount(0.0);
        assert!(matches!(bad_discount.validate(), Err(Error::InvalidDiscount(_))));

        let empty = Instance::new(0, 3, vec![], 0.8, 0.0);
        assert!(matches!(empty.validate(), Err(Error::InvalidDimensions { .. })));

        let mut duplicate = Instance::classic(-0.04);
        duplicate.cells.push(CellSpec::new(1, 1, 5.0));
        assert!(matches!(
            duplicate.validate(),
            Err(Error::DuplicateCell { x: 1, y: 1 })
        ));
    }

    #[test]
    fn rejects_open_cells_cut_off_from_terminals() {
        let no_terminal = Instance::new(2, 1, vec![], 0.8, -0.04);
        assert!(matches!(
            no_terminal.validate(),
            Err(Error::NoReachableTerminal { x: 0, y: 0 })
        ));

        // open | wall | +1
        let walled_off = Instance::new(
            3,
            1,
            vec![CellSpec::new(1, 0, 0.0), CellSpec::new(2, 0, 1.0)],
            0.8,
            -0.04,
        );
        assert!(matches!(
            walled_off.tiles(),
            Err(Error::NoReachableTerminal { x: 0, y: 0 })
        ));

        // a pocket in the top right corner sealed by walls
        let pocket = Instance::new(
            3,
            3,
            vec![
                CellSpec::new(0, 0, 1.0),
                CellSpec::new(1, 2, 0.0),
                CellSpec::new(2, 1, 0.0),
            ],
            0.8,
            -0.04,
        );
        assert!(matches!(
            pocket.validate(),
            Err(Error::NoReachableTerminal { x: 2, y: 2 })
        ));

        let all_terminal = Instance::new(1, 1, vec![CellSpec::new(0, 0, 1.0)], 1.0, 0.0);
        assert!(all_terminal.validate().is_ok(), "No open cell to strand");
        assert!(Instance::classic(-0.04).validate().is_ok());
    }

    #[test]
    fn json_fills_defaults() {
        let json = r#"{
            "width": 4,
            "height": 3,
            "cells": [{"x": 1, "y": 1, "reward": 0}, {"x": 3, "y": 2, "reward": 1}],
            "slip": 0.8,
            "step_reward": -0.04
        }"#;
        let instance = Instance::from_json(json).unwrap();
        assert_eq!(instance.discount, 0.5);
        assert_eq!(instance.sweeps, 100);
        assert_eq!(instance.episodes, 10_000);
        assert!(instance.cells[0].is_wall());

        let again = Instance::from_json(&instance.to_json().unwrap()).unwrap();
        assert_eq!(again, instance);
    }
}
