//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Agent, Env,
};
use anyhow::Result;

/// Runs a fixed number of episodes and reports the mean final score.
///
/// Episodes are reset with [`Env::reset_with_index`] so that repeated
/// evaluations see the same episodes. The agent is never updated: evaluation
/// episodes do not enter the training session.
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Episodes reaching this score are stopped.
    max_score: Option<u64>,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E, A> Evaluator<E, A> for DefaultEvaluator<E>
where
    E: Env,
    A: Agent<E>,
{
    fn evaluate(&mut self, agent: &mut A) -> Result<Record> {
        let mut score_total = 0u64;
        let mut score_max = 0u64;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;

            loop {
                let act = agent.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act);
                let capped = self.max_score.map_or(false, |m| step.score >= m);
                if step.is_done() || capped {
                    score_total += step.score;
                    score_max = score_max.max(step.score);
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(Record::from_slice(&[
            (
                "eval_score",
                RecordValue::Scalar(score_total as f32 / self.n_episodes as f32),
            ),
            ("eval_max_score", RecordValue::Scalar(score_max as f32)),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `env` - Environment the episodes are run in
    /// * `n_episodes` - Number of episodes to run during evaluation, must be positive
    /// * `max_score` - Score at which an evaluation episode is stopped
    pub fn new(env: E, n_episodes: usize, max_score: Option<u64>) -> Result<Self> {
        if n_episodes == 0 {
            return Err(crate::error::FlapqError::InvalidConfig(
                "evaluation needs at least one episode".to_string(),
            )
            .into());
        }
        Ok(Self {
            n_episodes,
            max_score,
            env,
        })
    }
}
