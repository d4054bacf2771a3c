#![warn(missing_docs)]
//! Core abstractions of flapq.
//!
//! This crate knows nothing about the game. It provides the vocabulary shared by
//! environments and agents ([`Env`], [`Policy`], [`Agent`]), the [`record`] types
//! used for metrics, and the episode-driven [`Trainer`].
pub mod error;
pub mod record;

mod base;
pub use base::{Act, Agent, Configurable, Env, Obs, Policy, Step};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};
