use log::{debug, info, trace};
use rand::Rng;

use crate::{
    assert_interval,
    decay::{self, Decay},
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Exp},
    exploration::{Choice, EpsilonGreedy},
};

/// Configuration for the [`QLearningAgent`]
#[derive(Debug, Clone)]
pub struct QLearningConfig<D: Decay = decay::Constant> {
    /// Exploration policy
    ///
    /// **Default**: epsilon greedy with a [`Constant`](decay::Constant) epsilon of `0.1`
    pub exploration: EpsilonGreedy<D>,
    /// Learning rate
    ///
    /// **Default**: `0.1`
    pub alpha: f64,
    /// Discount factor
    ///
    /// **Default**: `0.5`
    pub gamma: f64,
    /// Cut an episode short after this many steps
    ///
    /// **Default**: `None`, episodes only end on a terminal cell
    pub max_steps: Option<u32>,
}

impl Default for QLearningConfig<decay::Constant> {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(decay::Constant::new(0.1)),
            alpha: 0.1,
            gamma: 0.5,
            max_steps: None,
        }
    }
}

/// A tabular Q-learning agent
///
/// Q-values live in a dense table of `num_states × num_actions` entries, all zero
/// at first. After every step the visited entry moves towards the one-step target:
///
/// Q(s,a) ← Q(s,a) + α(r + γ max<sub>a'</sub> Q(s',a') - Q(s,a))
///
/// where the bootstrap term is zero once the episode has ended.
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn, with densely indexed
///   state and action spaces
/// - `R` - The random number generator used for exploration and episode starts
/// - `D` - The schedule of the exploration rate
pub struct QLearningAgent<E, R, D = decay::Constant>
where
    E: Environment + DiscreteActionSpace + DiscreteStateSpace,
    R: Rng,
    D: Decay,
{
    q_table: Vec<f64>,
    num_actions: usize,
    exploration: EpsilonGreedy<D>,
    alpha: f64,   // learning rate
    gamma: f64,   // discount factor
    episode: u32, // current episode
    max_steps: Option<u32>,
    rng: R,
    _env: std::marker::PhantomData<fn(&E)>,
}

impl<E, R, D> QLearningAgent<E, R, D>
where
    E: Environment + DiscreteActionSpace + DiscreteStateSpace,
    R: Rng,
    D: Decay,
{
    /// Initialize a new `QLearningAgent` sized for a given environment
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(env: &E, config: QLearningConfig<D>, rng: R) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        let num_actions = env.actions().len();
        Self {
            q_table: vec![0.0; env.num_states() * num_actions],
            num_actions,
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            episode: 0,
            max_steps: config.max_steps,
            rng,
            _env: std::marker::PhantomData,
        }
    }

    pub fn get_q_table(&self) -> &[f64] {
        &self.q_table
    }

    /// Number of completed episodes
    pub fn episodes(&self) -> u32 {
        self.episode
    }

    fn slot(&self, env: &E, state: &E::State, action: &E::Action) -> usize {
        env.state_index(state) * self.num_actions + env.action_index(action)
    }

    pub fn q_value(&self, env: &E, state: &E::State, action: &E::Action) -> f64 {
        self.q_table[self.slot(env, state, action)]
    }

    /// The first action with the highest Q-value in `state`
    pub fn best_action(&self, env: &E, state: &E::State) -> E::Action {
        self.greedy(env, state).0
    }

    /// The highest Q-value in `state`
    pub fn state_value(&self, env: &E, state: &E::State) -> f64 {
        self.greedy(env, state).1
    }

    fn greedy(&self, env: &E, state: &E::State) -> (E::Action, f64) {
        env.actions()
            .into_iter()
            .map(|a| (a, self.q_value(env, state, &a)))
            .fold(None, |best: Option<(E::Action, f64)>, (a, q)| match best {
                Some((_, best_q)) if best_q >= q => best,
                _ => Some((a, q)),
            })
            .expect("There is always at least one action available")
    }

    /// Choose an action with the epsilon greedy policy
    pub fn act(&mut self, env: &E, state: &E::State) -> E::Action {
        match self.exploration.choose(self.episode, &mut self.rng) {
            Choice::Explore => env.random_action(&mut self.rng),
            Choice::Exploit => self.best_action(env, state),
        }
    }

    /// Apply the one-step Q-learning update for an experience
    pub fn learn(&mut self, env: &E, experience: Exp<E>) {
        let Exp {
            state,
            action,
            next_state,
            reward,
        } = experience;

        let max_next_q = next_state.map_or(0.0, |s| self.state_value(env, &s));
        let slot = self.slot(env, &state, &action);
        let q_value = self.q_table[slot];
        self.q_table[slot] = q_value + self.alpha * (reward + self.gamma * max_next_q - q_value);
    }

    /// Run one episode from a random start until a terminal state is reached or the
    /// step cap is hit
    ///
    /// **Returns** the number of steps taken
    pub fn go(&mut self, env: &mut E) -> u32 {
        let mut steps = 0;
        let mut next_state = env.reset(&mut self.rng);
        while let Some(state) = next_state {
            if self.max_steps.is_some_and(|cap| steps >= cap) {
                trace!("episode {} cut off after {steps} steps", self.episode);
                break;
            }
            let action = self.act(env, &state);
            let (next, reward) = env.step(action);
            next_state = next;
            steps += 1;

            self.learn(
                env,
                Exp {
                    state,
                    action,
                    next_state,
                    reward,
                },
            );
        }

        trace!("episode {} took {steps} steps", self.episode);
        self.episode += 1;
        steps
    }

    /// Run a fixed number of episodes
    pub fn train(&mut self, env: &mut E, episodes: u32) {
        let mut total_steps = 0_u64;
        for i in 0..episodes {
            total_steps += u64::from(self.go(env));
            if (i + 1) % 1000 == 0 {
                debug!("{} episodes, {total_steps} steps so far", i + 1);
            }
        }
        info!("q-learning finished {episodes} episodes in {total_steps} steps");
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        algo::ValueIteration,
        grid::{Convention, Grid, Heading, PolicyCell, Tile, Xy},
        gym::{GridWalk, GridWorld},
        instance::Instance,
    };

    fn agent(env: &GridWalk, seed: u64) -> QLearningAgent<GridWalk, StdRng> {
        QLearningAgent::new(env, QLearningConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn update_moves_towards_target() {
        let env = GridWalk::from_instance(&Instance::classic(-0.04)).unwrap();
        let mut agent = agent(&env, 0);
        assert_eq!(agent.get_q_table().len(), 12 * 4);
        assert!(agent.get_q_table().iter().all(|q| *q == 0.0));

        agent.learn(
            &env,
            Exp {
                state: Xy::new(2, 2),
                action: Heading::Right,
                next_state: None,
                reward: 1.0,
            },
        );
        let q = agent.q_value(&env, &Xy::new(2, 2), &Heading::Right);
        assert!((q - 0.1).abs() < 1e-12, "alpha * reward, got {q}");

        agent.learn(
            &env,
            Exp {
                state: Xy::new(1, 2),
                action: Heading::Right,
                next_state: Some(Xy::new(2, 2)),
                reward: -0.04,
            },
        );
        let q = agent.q_value(&env, &Xy::new(1, 2), &Heading::Right);
        let expected = 0.1 * (-0.04 + 0.5 * 0.1);
        assert!((q - expected).abs() < 1e-12, "Bootstraps from best next action, got {q}");
    }

    #[test]
    fn greedy_ties_go_to_first_action() {
        let env = GridWalk::from_instance(&Instance::classic(-0.04)).unwrap();
        let mut agent = agent(&env, 0);
        assert_eq!(agent.best_action(&env, &Xy::new(0, 0)), Heading::Up);

        let slot = agent.slot(&env, &Xy::new(0, 0), &Heading::Left);
        agent.q_table[slot] = 0.5;
        let slot = agent.slot(&env, &Xy::new(0, 0), &Heading::Right);
        agent.q_table[slot] = 0.5;
        assert_eq!(agent.best_action(&env, &Xy::new(0, 0)), Heading::Left);
        assert_eq!(agent.state_value(&env, &Xy::new(0, 0)), 0.5);
    }

    #[test]
    fn greedy_agent_exploits() {
        let mut env = GridWalk::from_instance(&Instance::classic(-0.04)).unwrap();
        let config = QLearningConfig {
            exploration: EpsilonGreedy::new(decay::Constant::new(0.0)),
            ..Default::default()
        };
        let mut agent = QLearningAgent::new(&env, config, StdRng::seed_from_u64(1));
        let slot = agent.slot(&env, &Xy::new(0, 0), &Heading::Right);
        agent.q_table[slot] = 1.0;
        for _ in 0..20 {
            assert_eq!(agent.act(&env, &Xy::new(0, 0)), Heading::Right);
        }
        agent.train(&mut env, 10);
        assert_eq!(agent.episodes(), 10);
    }

    #[test]
    fn episodes_end_on_terminals() {
        let mut env = GridWalk::from_instance(&Instance::classic(-0.04)).unwrap();
        let mut agent = agent(&env, 2);
        for _ in 0..50 {
            assert!(agent.go(&mut env) >= 1);
            assert_eq!(env.position(), None, "Walker left the grid through a terminal");
        }
    }

    #[test]
    fn step_cap_ends_endless_episodes() {
        // no terminal to reach, only the cap can end an episode
        let tiles = Grid::filled(2, 1, Convention::BottomUp, Tile::Open);
        let mut env = GridWalk::new(&tiles, -0.04);
        let config = QLearningConfig {
            max_steps: Some(25),
            ..Default::default()
        };
        let mut agent = QLearningAgent::new(&env, config, StdRng::seed_from_u64(3));
        assert_eq!(agent.go(&mut env), 25);
        assert!(env.position().is_some(), "Episode was cut off, not finished");

        agent.train(&mut env, 4);
        assert_eq!(agent.episodes(), 5);
    }

    #[test]
    fn step_cap_leaves_short_episodes_alone() {
        let mut env = GridWalk::from_instance(&Instance::classic(-0.04)).unwrap();
        let config = QLearningConfig {
            max_steps: Some(10_000),
            ..Default::default()
        };
        let mut agent = QLearningAgent::new(&env, config, StdRng::seed_from_u64(4));
        for _ in 0..20 {
            assert!(agent.go(&mut env) < 10_000);
            assert_eq!(env.position(), None);
        }
    }

    #[test]
    fn approaches_exact_values() {
        let instance = Instance::classic(-0.04);
        let mut env = GridWalk::from_instance(&instance).unwrap();
        let config = QLearningConfig {
            gamma: instance.discount,
            ..Default::default()
        };
        let mut agent = QLearningAgent::new(&env, config, StdRng::seed_from_u64(42));
        agent.train(&mut env, 10_000);
        let learned = env.value_grid(&agent);

        let world = GridWorld::from_instance(&instance).unwrap();
        let exact = world
            .value_grid(&ValueIteration::for_instance(&instance).solve(&world))
            .reoriented(Convention::BottomUp);

        let mean = learned
            .cells()
            .iter()
            .zip(exact.cells())
            .map(|(a, b)| (a - b).abs())
            .sum::<f64>()
            / 12.0;
        assert!(mean < 0.3, "Mean absolute difference {mean}");

        assert_eq!(learned[Xy::new(3, 2)], 1.0, "Terminals report their reward");
        assert_eq!(learned[Xy::new(3, 1)], -1.0);
        assert_eq!(learned[Xy::new(1, 1)], 0.0, "Walls report zero");

        let policy = env.policy_grid(&agent);
        assert_eq!(env.policy_grid(&agent), policy, "Reading the policy twice changes nothing");
        assert_eq!(env.value_grid(&agent), learned);
        assert_eq!(policy[Xy::new(2, 2)], PolicyCell::Move(Heading::Right));
        assert_eq!(policy[Xy::new(1, 1)], PolicyCell::Wall);
        assert_eq!(policy[Xy::new(3, 2)], PolicyCell::Terminal(1.0));
    }
}
