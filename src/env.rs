use rand::{seq::SliceRandom, Rng};

/// A known, finite Markov decision process exposed through its transition kernel.
///
/// Planning algorithms such as [`ValueIteration`](crate::algo::ValueIteration) only ever
/// query a model, they never step it. States are mapped onto a dense index so that value
/// tables can be plain arrays. The absorbing sentinel reached after leaving a terminal
/// state has no index and is always valued zero.
pub trait Model {
    /// A state of the process
    type State: Copy + PartialEq;

    /// An action that can be taken in a state
    type Action: Copy + PartialEq;

    /// Every state that planning should iterate over
    fn states(&self) -> Vec<Self::State>;

    /// The actions available in `state`
    ///
    /// The returned vector should never be empty, instead specify an action that
    /// represents exiting if necessary.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// The distribution over next states for taking `action` in `state`
    ///
    /// Outcomes landing on the same state are not merged, their probabilities accumulate.
    fn transitions(&self, state: &Self::State, action: &Self::Action) -> Vec<Outcome<Self::State>>;

    /// The reward for the transition `state --action--> next_state`
    fn reward(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> f64;

    /// Determine if the state has a fixed value that planning never revisits
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Determine if the state is the absorbing sentinel past the end of an episode
    fn is_sentinel(&self, state: &Self::State) -> bool;

    /// Size of the dense state index
    fn num_states(&self) -> usize;

    /// Position of `state` in the dense index, or `None` for the sentinel
    fn state_index(&self, state: &Self::State) -> Option<usize>;
}

/// One branch of a stochastic transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome<S> {
    pub next_state: S,
    pub prob: f64,
}

/// An episodic environment that an agent learns from by sampling.
///
/// Sources of randomness are passed in explicitly so runs can be reproduced with a
/// seeded generator.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Copy;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Copy;

    /// Update the environment in response to an action taken by an agent, producing a
    /// new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` once the episode has ended
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f64);

    /// Reset the environment to a random initial state
    ///
    /// **Returns** the state, or `None` if no episode can be started
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Self::State>;
}

/// An environment with a finite action set that is the same in every state
pub trait DiscreteActionSpace: Environment {
    /// All actions, in the order used for tie-breaking
    fn actions(&self) -> Vec<Self::Action>;

    /// Position of `action` in [`actions`](Self::actions)
    fn action_index(&self, action: &Self::Action) -> usize;

    /// Pick an action uniformly at random
    fn random_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Action {
        *self
            .actions()
            .choose(rng)
            .expect("action space is not empty")
    }
}

/// An environment with a finite, densely indexed state set
pub trait DiscreteStateSpace: Environment {
    /// Size of the dense state index
    fn num_states(&self) -> usize;

    /// Position of `state` in the dense index
    fn state_index(&self, state: &Self::State) -> usize;
}

/// Represents a single experience or transition in the environment
pub struct Exp<E: Environment> {
    /// The state of the environment before taking the action
    pub state: E::State,
    /// The action taken in the given state
    pub action: E::Action,
    /// The state of the environment after the action is taken, or if terminal, `None`
    pub next_state: Option<E::State>,
    /// The reward received after taking the action
    pub reward: f64,
}
