//! Exploration strategies of the Q-learning agent.
use crate::{table::ActionValues, Action};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Explorers for [`QLearner`](super::QLearner). Only used in training mode.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum Explorer {
    /// Always take the greedy action.
    Greedy,

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl Default for Explorer {
    fn default() -> Self {
        Explorer::Greedy
    }
}

impl Explorer {
    /// Takes an action given the values of the current state.
    pub fn action(&self, values: &ActionValues, episode: usize, rng: &mut impl Rng) -> Action {
        match self {
            Explorer::Greedy => values.greedy(),
            Explorer::EpsilonGreedy(egreedy) => egreedy.action(values, episode, rng),
        }
    }

    /// Probability of a random action at the given episode.
    pub fn epsilon(&self, episode: usize) -> f64 {
        match self {
            Explorer::Greedy => 0.0,
            Explorer::EpsilonGreedy(egreedy) => egreedy.epsilon(episode),
        }
    }
}

/// Epsilon-greedy explorer.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_episode`
/// episodes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EpsilonGreedy {
    /// Initial epsilon.
    pub eps_start: f64,

    /// Final epsilon.
    pub eps_final: f64,

    /// Episode at which epsilon reaches `eps_final`.
    pub final_episode: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer, 0.1 decaying to zero over 10,000 episodes.
    pub fn new() -> Self {
        Self {
            eps_start: 0.1,
            eps_final: 0.0,
            final_episode: 10_000,
        }
    }

    /// Constructs epsilon-greedy explorer.
    pub fn with_params(eps_start: f64, eps_final: f64, final_episode: usize) -> Explorer {
        Explorer::EpsilonGreedy(Self {
            eps_start,
            eps_final,
            final_episode,
        })
    }

    /// Epsilon at the given episode.
    pub fn epsilon(&self, episode: usize) -> f64 {
        if episode >= self.final_episode {
            return self.eps_final;
        }
        let d = (self.eps_start - self.eps_final) / (self.final_episode as f64);
        self.eps_start - d * episode as f64
    }

    /// Takes a uniformly random action with probability epsilon, the greedy one otherwise.
    pub fn action(&self, values: &ActionValues, episode: usize, rng: &mut impl Rng) -> Action {
        let eps = self.epsilon(episode);
        if rng.gen::<f64>() < eps {
            if rng.gen_bool(0.5) {
                Action::Flap
            } else {
                Action::Noop
            }
        } else {
            values.greedy()
        }
    }
}
