//! Tabular Q-learning for a side-scrolling obstacle-avoidance game.
//!
//! flapq consists of the following crates:
//!
//! * [flapq-core](../flapq_core/index.html) provides the environment and agent
//!   traits, the records used for metrics and the episode-driven `Trainer`.
//! * [flapq-tabular](../flapq_tabular/index.html) implements the state
//!   discretizer, the sparse and dense Q-tables with their JSON persistence and
//!   the `QLearner` agent.
//! * flapq is a command-line tool on persisted training state.

pub mod util;
