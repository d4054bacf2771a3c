//! Agent.
use super::{Env, Policy};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// A tabular agent learns from whole episodes: it is asked for an action at
/// every tick through [`Policy::sample`] and receives the final score of the
/// episode through [`Agent::update`].
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Closes an episode with its final score.
    ///
    /// This is called exactly once per episode, after the last tick. In training
    /// mode the agent learns from the episode; in any mode the episode
    /// bookkeeping advances. The returned record describes the episode.
    fn update(&mut self, score: u64) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// The directory is created if it does not exist.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    ///
    /// Missing files are not an error; the agent starts from scratch.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
