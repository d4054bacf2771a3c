//! Train [`Agent`].
mod config;
use crate::{
    error::FlapqError,
    record::{AggregateRecorder, Record, RecordValue},
    Agent, Env, Evaluator,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::{info, warn};
use std::path::Path;
use std::time::SystemTime;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// # Training loop
///
/// 1. Reset [`Env`] and get the first observation.
/// 2. Ask the agent for an action with [`Policy::sample`] and apply it to the
///    environment. Repeat until the episode is done, either because the agent died
///    or because the score reached `max_score`.
/// 3. Close the episode with [`Agent::update`] and the final score. The returned
///    record, extended with the episode length and a timestamp, is stored in the
///    recorder.
/// 4. `episodes += 1`, then
///     * if `episodes % eval_interval == 0`, evaluate the agent in evaluation mode
///       and save it in `(model_dir)/best` when the evaluation score is the best so far,
///     * if `episodes % save_interval == 0`, save the agent in `model_dir`,
///     * if `episodes % flush_record_interval == 0`, flush the recorder.
/// 5. Back to 1 until `max_episodes` episodes are done, then save the agent in
///    `model_dir` a last time.
///
/// An interval of zero disables the corresponding action.
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|final score|C[Agent::update]
///     C -->|Record|D[AggregateRecorder]
/// ```
///
/// [`Policy::sample`]: crate::Policy::sample
pub struct Trainer {
    /// The number of training episodes.
    max_episodes: usize,

    /// Score cap of an episode.
    max_score: Option<u64>,

    /// Interval of evaluation in episodes.
    eval_interval: usize,

    /// Interval of flushing records in episodes.
    flush_records_interval: usize,

    /// Interval of saving the agent in episodes.
    save_interval: usize,

    /// Where to save the trained agent.
    model_dir: Option<String>,
}

fn is_due(count: usize, interval: usize) -> bool {
    interval > 0 && count % interval == 0
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            max_episodes: config.max_episodes,
            max_score: config.max_score,
            eval_interval: config.eval_interval,
            flush_records_interval: config.flush_record_interval,
            save_interval: config.save_interval,
            model_dir: config.model_dir,
        }
    }

    fn save_model<E: Env, A: Agent<E>>(agent: &A, model_dir: &Path) {
        match agent.save_params(model_dir) {
            Ok(()) => info!("Saved the model in {:?}.", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    fn save_best_model<E: Env, A: Agent<E>>(agent: &A, model_dir: &str) {
        let model_dir = Path::new(model_dir).join("best");
        Self::save_model(agent, &model_dir);
    }

    /// Runs one episode and closes it with [`Agent::update`].
    ///
    /// Returns the record of the episode and its final score.
    pub fn train_episode<E, A>(&self, env: &mut E, agent: &mut A) -> Result<(Record, u64)>
    where
        E: Env,
        A: Agent<E>,
    {
        let timer = SystemTime::now();
        let mut obs = env.reset()?;
        let mut n_ticks = 0usize;
        let mut record = Record::empty();

        loop {
            let act = agent.sample(&obs)?;
            let (step, record_env) = env.step(&act);
            record.merge_inplace(record_env);
            n_ticks += 1;

            let capped = self.max_score.map_or(false, |m| step.score >= m);
            if step.is_done() || capped {
                let record_agent = agent.update(step.score)?;
                let secs = timer.elapsed()?.as_secs_f32();
                record.merge_inplace(record_agent);
                record.insert("n_ticks", RecordValue::Scalar(n_ticks as f32));
                if secs > 0.0 {
                    record.insert("ticks_per_sec", RecordValue::Scalar(n_ticks as f32 / secs));
                }
                record.insert("datetime", RecordValue::DateTime(Local::now()));
                return Ok((record, step.score));
            }

            obs = step.obs;
        }
    }

    /// Train the agent.
    pub fn train<E, A, D>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        recorder: &mut Box<dyn AggregateRecorder>,
        evaluator: &mut D,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<E>,
        D: Evaluator<E, A>,
    {
        if self.max_episodes == 0 {
            return Err(FlapqError::InvalidConfig("max_episodes must be positive".to_string()).into());
        }

        let mut max_eval_score = f32::MIN;
        let mut episodes: usize = 0;
        agent.train();

        loop {
            let (mut record, score) = self.train_episode(env, agent)?;
            episodes += 1;

            if is_due(episodes, self.eval_interval) {
                info!("Starts evaluation of the trained model");
                agent.eval();
                let record_eval = evaluator.evaluate(agent)?;
                agent.train();
                let eval_score = record_eval.get_scalar("eval_score")?;
                record.merge_inplace(record_eval);

                if eval_score > max_eval_score {
                    max_eval_score = eval_score;
                    if let Some(model_dir) = self.model_dir.as_ref() {
                        Self::save_best_model(agent, model_dir);
                    }
                }
            }

            if is_due(episodes, self.save_interval) {
                match self.model_dir.as_ref() {
                    Some(model_dir) => Self::save_model(agent, Path::new(model_dir)),
                    None => warn!("No model_dir is given, skip saving at episode {}", episodes),
                }
            }

            log::debug!("Episode {} finished with score {}", episodes, score);
            recorder.store(record);

            if is_due(episodes, self.flush_records_interval) {
                recorder.flush(episodes as _);
            }

            if episodes == self.max_episodes {
                break;
            }
        }

        if let Some(model_dir) = self.model_dir.as_ref() {
            Self::save_model(agent, Path::new(model_dir));
        }

        Ok(())
    }
}
