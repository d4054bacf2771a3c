//! Configuration of Q-learning agent.
use super::{decay::LrDecay, explorer::Explorer};
use crate::DiscretizerConfig;
use anyhow::Result;
use flapq_core::error::FlapqError;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Rewards given during the backward replay.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Rewards {
    /// Reward of a move that did not contribute to the death.
    pub neutral: f64,

    /// Reward of a move that led to the death.
    pub death: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            neutral: 0.0,
            death: -1000.0,
        }
    }
}

/// Constructs [`QLearner`](super::QLearner).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct QLearnerConfig {
    /// Start in training mode.
    pub train: bool,

    /// Discount factor of future values.
    pub discount_factor: f64,

    /// Initial learning rate.
    pub alpha: f64,

    /// Learning-rate schedule.
    #[serde(default)]
    pub lr_decay: LrDecay,

    /// Exploration in training mode.
    #[serde(default)]
    pub explorer: Explorer,

    /// Rewards of the backward replay.
    #[serde(default)]
    pub rewards: Rewards,

    /// Moves kept in memory during an episode before the oldest are flushed.
    pub max_moves: usize,

    /// Vertical offset above which a death counts as a death in the upper region.
    pub high_death_threshold: i32,

    /// Seed of the exploration random number generator.
    #[serde(default)]
    pub seed: u64,

    /// Bucketing constants.
    #[serde(default)]
    pub discretizer: DiscretizerConfig,
}

impl Default for QLearnerConfig {
    fn default() -> Self {
        Self {
            train: true,
            discount_factor: 0.95,
            alpha: 0.7,
            lr_decay: LrDecay::default(),
            explorer: Explorer::default(),
            rewards: Rewards::default(),
            max_moves: 1_000_000,
            high_death_threshold: 120,
            seed: 42,
            discretizer: DiscretizerConfig::default(),
        }
    }
}

impl QLearnerConfig {
    /// Sets the initial mode.
    pub fn train(mut self, v: bool) -> Self {
        self.train = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Initial learning rate.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Learning-rate schedule.
    pub fn lr_decay(mut self, v: LrDecay) -> Self {
        self.lr_decay = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: Explorer) -> Self {
        self.explorer = v;
        self
    }

    /// Rewards.
    pub fn rewards(mut self, v: Rewards) -> Self {
        self.rewards = v;
        self
    }

    /// Bound of the in-memory move history.
    pub fn max_moves(mut self, v: usize) -> Self {
        self.max_moves = v;
        self
    }

    /// Threshold of a death in the upper region.
    pub fn high_death_threshold(mut self, v: i32) -> Self {
        self.high_death_threshold = v;
        self
    }

    /// Seed of the exploration.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Bucketing constants.
    pub fn discretizer(mut self, v: DiscretizerConfig) -> Self {
        self.discretizer = v;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), FlapqError> {
        let invalid = |msg: &str| Err(FlapqError::InvalidConfig(msg.to_string()));
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return invalid("discount_factor must be in [0, 1]");
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return invalid("alpha must be in (0, 1]");
        }
        if self.max_moves == 0 {
            return invalid("max_moves must be positive");
        }
        let d = &self.discretizer;
        if d.x_fine_step <= 0 || d.x_coarse_step <= 0 || d.y_fine_step <= 0 || d.y_coarse_step <= 0
        {
            return invalid("bucket widths must be positive");
        }
        Ok(())
    }

    /// Loads [`QLearnerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b: Self = serde_yaml::from_reader(rdr)?;
        b.validate()?;
        info!("Load config of Q-learning agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`QLearnerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of Q-learning agent into {}", path_.display());
        Ok(())
    }
}
