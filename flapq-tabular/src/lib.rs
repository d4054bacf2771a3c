#![warn(missing_docs)]
//! Tabular Q-learning for a side-scrolling obstacle-avoidance game.
//!
//! * [`discretizer`] maps a continuous [`Observation`] to a bucketed [`State`].
//! * [`table`] stores action values per state, sparsely ([`SparseQTable`]) or in a
//!   dense array ([`DenseQTable`]), and persists them.
//! * [`qlearning`] holds the [`QLearner`] agent, which acts greedily on the table and
//!   replays each episode backward when it ends.
pub mod discretizer;
pub mod qlearning;
pub mod table;

pub use discretizer::{Action, Discretizer, DiscretizerConfig, Observation, PipePair, State};
pub use qlearning::{
    EpsilonGreedy, Explorer, LrDecay, QLearner, QLearnerConfig, Rewards, TrainingSession,
    Transition, SESSION_FILE,
};
pub use table::{ActionValues, AxisSpec, DenseLayout, DenseQTable, QStore, SparseQTable};
