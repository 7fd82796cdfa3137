use rand::Rng;

use crate::{assert_interval, decay::Decay};

/// Exploration policy result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Explore,
    Exploit,
}

/// Epsilon greedy exploration policy with a scheduled epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// The exploration probability for a given episode
    pub fn epsilon(&self, episode: u32) -> f64 {
        self.epsilon.evaluate(episode as f64)
    }

    /// Invoke epsilon greedy policy for current episode
    ///
    /// **Panics** if the schedule evaluates outside of `[0,1]`
    pub fn choose<R: Rng + ?Sized>(&self, episode: u32, rng: &mut R) -> Choice {
        let epsilon = self.epsilon(episode);
        assert_interval!(epsilon, 0.0, 1.0);
        if rng.gen::<f64>() < epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}
