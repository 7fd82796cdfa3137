use rand::{seq::SliceRandom, Rng};
use strum::VariantArray;

use crate::{
    algo::QLearningAgent,
    decay::Decay,
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment},
    error::Result,
    grid::{Convention, Grid, Heading, PolicyCell, Tile, Xy},
    instance::Instance,
};

/// A deterministic walk over a grid world, used to train agents by sampling
///
/// Cells are addressed bottom-up as [`Xy`]. Every move goes exactly where it is
/// aimed, exploration noise stands in for the slip of the planning models. Moves
/// off the grid or into a wall leave the walker in place. Landing on a terminal
/// cell pays its reward and ends the episode, every other landing pays the step reward.
#[derive(Debug, Clone)]
pub struct GridWalk {
    tiles: Grid<Tile>,
    step_reward: f64,
    pos: Option<Xy>,
}

impl GridWalk {
    pub fn new(tiles: &Grid<Tile>, step_reward: f64) -> Self {
        Self {
            tiles: tiles.reoriented(Convention::BottomUp),
            step_reward,
            pos: None,
        }
    }

    /// Build the walk described by a validated instance
    pub fn from_instance(instance: &Instance) -> Result<Self> {
        let tiles = instance.tiles()?;
        Ok(Self::new(&tiles, instance.step_reward))
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    /// The walker's current cell, `None` between episodes
    pub fn position(&self) -> Option<Xy> {
        self.pos
    }

    /// Move the walker to a given cell
    pub fn place(&mut self, pos: Xy) {
        self.pos = Some(pos);
    }

    /// The cell reached by moving from `from` towards `heading`
    pub fn destination(&self, from: Xy, heading: Heading) -> Xy {
        let (dx, dy) = heading.offset();
        let x = from.x as isize + dx;
        let y = from.y as isize + dy;
        if !self.tiles.contains(x, y) {
            return from;
        }
        let to = Xy::new(x as usize, y as usize);
        if self.tiles[to].is_wall() {
            from
        } else {
            to
        }
    }

    fn open_cells(&self) -> Vec<Xy> {
        self.tiles
            .iter()
            .filter(|(_, tile)| **tile == Tile::Open)
            .map(|((y, x), _)| Xy::new(x, y))
            .collect()
    }

    /// Greedy action per cell of a trained agent
    pub fn policy_grid<R, D>(&self, agent: &QLearningAgent<Self, R, D>) -> Grid<PolicyCell<Heading>>
    where
        R: Rng,
        D: Decay,
    {
        Grid::from_fn(self.width(), self.height(), Convention::BottomUp, |y, x| {
            match *self.tiles.get(y, x) {
                Tile::Wall => PolicyCell::Wall,
                Tile::Terminal(reward) => PolicyCell::Terminal(reward),
                Tile::Open => PolicyCell::Move(agent.best_action(self, &Xy::new(x, y))),
            }
        })
    }

    /// Best Q-value per cell of a trained agent, terminals read as their reward and walls as zero
    pub fn value_grid<R, D>(&self, agent: &QLearningAgent<Self, R, D>) -> Grid<f64>
    where
        R: Rng,
        D: Decay,
    {
        Grid::from_fn(self.width(), self.height(), Convention::BottomUp, |y, x| {
            match *self.tiles.get(y, x) {
                Tile::Wall => 0.0,
                Tile::Terminal(reward) => reward,
                Tile::Open => agent.state_value(self, &Xy::new(x, y)),
            }
        })
    }
}

impl Environment for GridWalk {
    type State = Xy;
    type Action = Heading;

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f64) {
        let Some(from) = self.pos else {
            return (None, 0.0);
        };
        let to = self.destination(from, action);

        match self.tiles[to] {
            Tile::Terminal(reward) => {
                self.pos = None;
                (None, reward)
            }
            _ => {
                self.pos = Some(to);
                (Some(to), self.step_reward)
            }
        }
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Self::State> {
        self.pos = self.open_cells().choose(rng).copied();
        self.pos
    }
}

impl DiscreteActionSpace for GridWalk {
    fn actions(&self) -> Vec<Self::Action> {
        Heading::VARIANTS.to_vec()
    }

    fn action_index(&self, action: &Self::Action) -> usize {
        *action as usize
    }
}

impl DiscreteStateSpace for GridWalk {
    fn num_states(&self) -> usize {
        self.width() * self.height()
    }

    fn state_index(&self, state: &Self::State) -> usize {
        state.y * self.width() + state.x
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn classic() -> GridWalk {
        GridWalk::from_instance(&Instance::classic(-0.04)).unwrap()
    }

    #[test]
    fn moves_are_deterministic_and_blocked() {
        let env = classic();
        assert_eq!(env.destination(Xy::new(0, 0), Heading::Up), Xy::new(0, 1));
        assert_eq!(env.destination(Xy::new(0, 0), Heading::Left), Xy::new(0, 0), "Left edge");
        assert_eq!(env.destination(Xy::new(0, 0), Heading::Down), Xy::new(0, 0), "Bottom edge");
        assert_eq!(env.destination(Xy::new(2, 2), Heading::Up), Xy::new(2, 2), "Top edge");
        assert_eq!(env.destination(Xy::new(3, 0), Heading::Right), Xy::new(3, 0), "Right edge");
        assert_eq!(env.destination(Xy::new(0, 1), Heading::Right), Xy::new(0, 1), "Wall");
    }

    #[test]
    fn entering_terminal_ends_episode() {
        let mut env = classic();
        env.place(Xy::new(2, 2));
        assert_eq!(env.step(Heading::Right), (None, 1.0));
        assert_eq!(env.position(), None);
        assert_eq!(env.step(Heading::Right), (None, 0.0), "Nothing to step after the end");

        env.place(Xy::new(2, 1));
        assert_eq!(env.step(Heading::Left), (Some(Xy::new(2, 1)), -0.04), "Bumping a wall");
        assert_eq!(env.step(Heading::Right), (None, -1.0));
    }

    #[test]
    fn reset_starts_on_open_cells() {
        let mut env = classic();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let start = env.reset(&mut rng).unwrap();
            assert!(
                ![Xy::new(1, 1), Xy::new(3, 2), Xy::new(3, 1)].contains(&start),
                "Started on {start}"
            );
        }

        let mut closed = GridWalk::from_instance(&Instance::new(
            1,
            1,
            vec![crate::instance::CellSpec::new(0, 0, 1.0)],
            1.0,
            0.0,
        ))
        .unwrap();
        assert_eq!(closed.reset(&mut rng), None, "No open cell to start from");
    }

    #[test]
    fn dense_indices() {
        let env = classic();
        assert_eq!(env.num_states(), 12);
        assert_eq!(env.state_index(&Xy::new(3, 2)), 11);
        let actions = env.actions();
        for (i, action) in actions.iter().enumerate() {
            assert_eq!(env.action_index(action), i);
        }
    }
}
