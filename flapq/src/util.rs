//! Operations on a model directory.
use anyhow::{Context, Result};
use flapq_core::TrainerConfig;
use flapq_tabular::{
    table::{load_table, Q_TABLE_FILE},
    QLearnerConfig, TrainingSession, SESSION_FILE,
};
use log::info;
use std::{fmt, fs, path::Path};

/// Scores averaged in [`Summary::mean_recent_score`].
pub const N_RECENT_SCORES: usize = 100;

/// Overview of the training state saved in a model directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Number of states in the Q-table.
    pub n_states: usize,

    /// Number of states updated at least once.
    pub n_visited: usize,

    /// Number of training episodes.
    pub episodes: usize,

    /// Best score.
    pub max_score: u64,

    /// Mean score of the last [`N_RECENT_SCORES`] episodes.
    pub mean_recent_score: Option<f64>,
}

impl Summary {
    /// Reads the Q-table and the training session in `dir`.
    ///
    /// Missing files count as an empty training state.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = load_table(&dir.join(Q_TABLE_FILE))
            .with_context(|| format!("Failed to load the Q-table in {:?}", dir))?
            .unwrap_or_default();
        let session = TrainingSession::load(&dir.join(SESSION_FILE))
            .with_context(|| format!("Failed to load the training session in {:?}", dir))?
            .unwrap_or_default();

        Ok(Self {
            n_states: entries.len(),
            n_visited: entries.iter().filter(|(_, v)| v.visits > 0).count(),
            episodes: session.episode(),
            max_score: session.max_score(),
            mean_recent_score: session.mean_recent(N_RECENT_SCORES),
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "states:         {}", self.n_states)?;
        writeln!(f, "visited states: {}", self.n_visited)?;
        writeln!(f, "episodes:       {}", self.episodes)?;
        writeln!(f, "max score:      {}", self.max_score)?;
        match self.mean_recent_score {
            Some(mean) => write!(f, "mean of last {}: {:.2}", N_RECENT_SCORES, mean),
            None => write!(f, "mean of last {}: -", N_RECENT_SCORES),
        }
    }
}

/// Writes the default agent and trainer configurations as `agent.yaml` and
/// `trainer.yaml` in `out`.
pub fn write_default_configs(out: &Path) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("Failed to create {:?}", out))?;
    QLearnerConfig::default().save(out.join("agent.yaml"))?;
    TrainerConfig::default().save(out.join("trainer.yaml"))?;
    info!("Wrote default configurations in {:?}", out);
    Ok(())
}
