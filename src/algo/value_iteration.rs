use log::{debug, info};

use crate::{assert_interval, env::Model, instance::Instance};

/// Exact value iteration over any [`Model`]
///
/// Runs a fixed number of synchronous Bellman backups:
///
/// V<sub>k+1</sub>(s) = max<sub>a</sub> Σ<sub>s'</sub> P(s'|s,a) (R(s,a,s') + γV<sub>k</sub>(s'))
///
/// Each sweep reads only the previous sweep's table. Terminal states are seeded with a
/// one-step lookahead against the zero table, which is their fixed reward, and are never
/// backed up again. The sentinel state is always worth zero. There is no convergence test,
/// the solver always performs every configured sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueIteration {
    discount: f64,
    iterations: u32,
}

impl ValueIteration {
    /// **Panics** if `discount` is not in the interval `[0,1]`
    pub fn new(discount: f64, iterations: u32) -> Self {
        assert_interval!(discount, 0.0, 1.0);
        Self {
            discount,
            iterations,
        }
    }

    /// Use the instance's discount and sweep budget
    pub fn for_instance(instance: &Instance) -> Self {
        Self::new(instance.discount, instance.sweeps)
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Run every sweep and return the value table, indexed by [`Model::state_index`]
    pub fn solve<M: Model>(&self, model: &M) -> Vec<f64> {
        let mut values = self.initial_values(model);
        for sweep in 0..self.iterations {
            let next = self.sweep(model, &values);
            let change = values
                .iter()
                .zip(&next)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            debug!("sweep {}: largest change {change:.6}", sweep + 1);
            values = next;
        }
        info!(
            "value iteration finished {} sweeps over {} states",
            self.iterations,
            model.states().len()
        );
        values
    }

    /// A zero table with terminal states set to their fixed value
    pub fn initial_values<M: Model>(&self, model: &M) -> Vec<f64> {
        let zeros = vec![0.0; model.num_states()];
        let mut values = zeros.clone();
        for state in model.states() {
            if let (true, Some(i)) = (model.is_terminal(&state), model.state_index(&state)) {
                values[i] = self.best_q_value(model, &state, &zeros);
            }
        }
        values
    }

    /// One synchronous backup of every non-terminal state
    pub fn sweep<M: Model>(&self, model: &M, values: &[f64]) -> Vec<f64> {
        let mut next = values.to_vec();
        for state in model.states() {
            if model.is_sentinel(&state) || model.is_terminal(&state) {
                continue;
            }
            if let Some(i) = model.state_index(&state) {
                next[i] = self.best_q_value(model, &state, values);
            }
        }
        next
    }

    /// Expected return of taking `action` in `state` and then following `values`
    pub fn q_value<M: Model>(
        &self,
        model: &M,
        state: &M::State,
        action: &M::Action,
        values: &[f64],
    ) -> f64 {
        model
            .transitions(state, action)
            .iter()
            .map(|outcome| {
                let reward = model.reward(state, action, &outcome.next_state);
                let next_value = value_of(model, values, &outcome.next_state);
                outcome.prob * (reward + self.discount * next_value)
            })
            .sum()
    }

    /// Every Q-value of every non-sentinel state
    pub fn q_values<M: Model>(&self, model: &M, values: &[f64]) -> Vec<(M::State, M::Action, f64)> {
        let mut q_values = Vec::new();
        for state in model.states() {
            if model.is_sentinel(&state) {
                continue;
            }
            for action in model.legal_actions(&state) {
                let q = self.q_value(model, &state, &action, values);
                q_values.push((state, action, q));
            }
        }
        q_values
    }

    /// Greedy action for each non-terminal state, indexed by [`Model::state_index`]
    ///
    /// Ties go to the first action in [`Model::legal_actions`] order.
    pub fn policy<M: Model>(&self, model: &M, values: &[f64]) -> Vec<Option<M::Action>> {
        let mut policy = vec![None; model.num_states()];
        for state in model.states() {
            if model.is_sentinel(&state) || model.is_terminal(&state) {
                continue;
            }
            if let Some(i) = model.state_index(&state) {
                policy[i] = self.best_action(model, &state, values).map(|(action, _)| action);
            }
        }
        policy
    }

    fn best_action<M: Model>(
        &self,
        model: &M,
        state: &M::State,
        values: &[f64],
    ) -> Option<(M::Action, f64)> {
        model
            .legal_actions(state)
            .into_iter()
            .map(|action| (action, self.q_value(model, state, &action, values)))
            .fold(None, |best, (action, q)| match best {
                Some((_, best_q)) if best_q >= q => best,
                _ => Some((action, q)),
            })
    }

    fn best_q_value<M: Model>(&self, model: &M, state: &M::State, values: &[f64]) -> f64 {
        self.best_action(model, state, values)
            .map(|(_, q)| q)
            .unwrap_or(0.0)
    }
}

/// Value of a state in a dense table, the sentinel is worth zero
pub fn value_of<M: Model>(model: &M, values: &[f64], state: &M::State) -> f64 {
    model.state_index(state).map_or(0.0, |i| values[i])
}
