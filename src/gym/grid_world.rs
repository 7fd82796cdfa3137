use crate::{
    env::{Model, Outcome},
    error::Result,
    grid::{Compass, Convention, Grid, GridAction, PolicyCell, RowCol, Tile},
    instance::Instance,
};

/// A state of the [`GridWorld`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridState {
    Cell(RowCol),
    /// Absorbing sentinel reached by exiting a terminal cell
    Exited,
}

/// A stochastic grid world with slippery moves, exposed as a [`Model`]
///
/// Cells are addressed top-down as [`RowCol`]. An action moves in its intended
/// direction with probability `slip` and slips to each perpendicular direction
/// with probability `(1 - slip) / 2`. Moves off the grid keep the overflowing
/// axis where it was, moves into walls stay in place. Terminal cells only allow
/// [`GridAction::Exit`], which pays the terminal reward and ends the episode.
///
/// A zero `step_reward` gives the plain variant where only terminals pay out.
#[derive(Debug, Clone)]
pub struct GridWorld {
    tiles: Grid<Tile>,
    slip: f64,
    step_reward: f64,
}

impl GridWorld {
    pub fn new(tiles: &Grid<Tile>, slip: f64, step_reward: f64) -> Self {
        Self {
            tiles: tiles.reoriented(Convention::TopDown),
            slip,
            step_reward,
        }
    }

    /// Build the world described by a validated instance
    pub fn from_instance(instance: &Instance) -> Result<Self> {
        let tiles = instance.tiles()?;
        Ok(Self::new(&tiles, instance.slip, instance.step_reward))
    }

    pub fn rows(&self) -> usize {
        self.tiles.height()
    }

    pub fn cols(&self) -> usize {
        self.tiles.width()
    }

    /// Where a move from `origin` towards `dir` ends up
    fn landing(&self, origin: RowCol, dir: Compass) -> RowCol {
        let (d_row, d_col) = dir.offset();
        let row = origin.row as isize + d_row;
        let col = origin.col as isize + d_col;

        let row = if (0..self.rows() as isize).contains(&row) {
            row as usize
        } else {
            origin.row
        };
        let col = if (0..self.cols() as isize).contains(&col) {
            col as usize
        } else {
            origin.col
        };

        let landing = RowCol::new(row, col);
        if self.tiles[landing].is_wall() {
            origin
        } else {
            landing
        }
    }

    /// Lay a value table indexed by [`Model::state_index`] out on the grid, walls read as zero
    pub fn value_grid(&self, values: &[f64]) -> Grid<f64> {
        Grid::from_fn(self.cols(), self.rows(), Convention::TopDown, |row, col| {
            match self.tiles.get(row, col) {
                Tile::Wall => 0.0,
                _ => values[row * self.cols() + col],
            }
        })
    }

    /// Lay a policy indexed by [`Model::state_index`] out on the grid
    pub fn policy_grid(&self, policy: &[Option<GridAction>]) -> Grid<PolicyCell<Compass>> {
        Grid::from_fn(self.cols(), self.rows(), Convention::TopDown, |row, col| {
            match *self.tiles.get(row, col) {
                Tile::Wall => PolicyCell::Wall,
                Tile::Terminal(reward) => PolicyCell::Terminal(reward),
                Tile::Open => match policy[row * self.cols() + col] {
                    Some(GridAction::Move(dir)) => PolicyCell::Move(dir),
                    _ => PolicyCell::Unset,
                },
            }
        })
    }
}

impl Model for GridWorld {
    type State = GridState;
    type Action = GridAction;

    fn states(&self) -> Vec<Self::State> {
        self.tiles
            .iter()
            .filter(|(_, tile)| !tile.is_wall())
            .map(|((row, col), _)| GridState::Cell(RowCol::new(row, col)))
            .collect()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(state) {
            vec![GridAction::Exit]
        } else {
            [Compass::North, Compass::East, Compass::South, Compass::West]
                .map(GridAction::Move)
                .to_vec()
        }
    }

    fn transitions(&self, state: &Self::State, action: &Self::Action) -> Vec<Outcome<Self::State>> {
        let GridState::Cell(origin) = *state else {
            return vec![];
        };
        if self.is_terminal(state) {
            return vec![Outcome {
                next_state: GridState::Exited,
                prob: 1.0,
            }];
        }
        let GridAction::Move(intended) = *action else {
            return vec![];
        };

        let side = (1.0 - self.slip) / 2.0;
        [(0, self.slip), (-1, side), (1, side)]
            .into_iter()
            .map(|(turn, prob)| Outcome {
                next_state: GridState::Cell(self.landing(origin, intended.turned(turn))),
                prob,
            })
            .collect()
    }

    fn reward(
        &self,
        state: &Self::State,
        _action: &Self::Action,
        _next_state: &Self::State,
    ) -> f64 {
        match state {
            GridState::Cell(cell) => self.tiles[*cell]
                .terminal_reward()
                .unwrap_or(self.step_reward),
            GridState::Exited => 0.0,
        }
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        match state {
            GridState::Cell(cell) => self.tiles[*cell].terminal_reward().is_some(),
            GridState::Exited => false,
        }
    }

    fn is_sentinel(&self, state: &Self::State) -> bool {
        *state == GridState::Exited
    }

    fn num_states(&self) -> usize {
        self.rows() * self.cols()
    }

    fn state_index(&self, state: &Self::State) -> Option<usize> {
        match state {
            GridState::Cell(cell) => Some(cell.row * self.cols() + cell.col),
            GridState::Exited => None,
        }
    }
}
