//! Q-learning agent with backward credit assignment.
mod base;
mod config;
mod decay;
mod explorer;
mod replay;
mod session;
pub use base::QLearner;
pub use config::{QLearnerConfig, Rewards};
pub use decay::LrDecay;
pub use explorer::{EpsilonGreedy, Explorer};
pub use replay::{q_update, CreditAssigner, Transition};
pub use session::{TrainingSession, SESSION_FILE};
