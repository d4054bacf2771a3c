//! Episode bookkeeping of a training run.
use crate::table::write_atomic;
use anyhow::Result;
use flapq_core::error::FlapqError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Name of the training-session file in a model directory.
pub const SESSION_FILE: &str = "training_values.json";

/// On-disk form: episode indices `1..=n` and the parallel scores.
#[derive(Deserialize, Serialize)]
struct SessionFile {
    episodes: Vec<usize>,
    scores: Vec<u64>,
}

/// Episode counter and score history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingSession {
    episode: usize,
    scores: Vec<u64>,
    max_score: u64,
}

impl TrainingSession {
    /// Constructs a session at episode 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed episodes.
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Final scores of the episodes, oldest first.
    pub fn scores(&self) -> &[u64] {
        &self.scores
    }

    /// Best final score so far, 0 before the first episode.
    pub fn max_score(&self) -> u64 {
        self.max_score
    }

    /// Closes an episode.
    pub fn record_episode(&mut self, score: u64) {
        self.episode += 1;
        self.scores.push(score);
        self.max_score = self.max_score.max(score);
    }

    /// Mean of the last `n` scores, `None` if there are none.
    pub fn mean_recent(&self, n: usize) -> Option<f64> {
        let recent = &self.scores[self.scores.len().saturating_sub(n)..];
        if recent.is_empty() || n == 0 {
            None
        } else {
            Some(recent.iter().sum::<u64>() as f64 / recent.len() as f64)
        }
    }

    /// Saves the session as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = SessionFile {
            episodes: (1..=self.scores.len()).collect(),
            scores: self.scores.clone(),
        };
        write_atomic(path, &serde_json::to_vec(&file)?)?;
        info!("Saved training session with {} episodes into {:?}", self.episode, path);
        Ok(())
    }

    /// Loads a session saved with [`TrainingSession::save`].
    ///
    /// Returns `Ok(None)` if the file cannot be read.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read training session {:?} ({}), starting at episode 0", path, e);
                return Ok(None);
            }
        };
        let file: SessionFile = serde_json::from_slice(&bytes)
            .map_err(|e| FlapqError::MalformedSession(e.to_string()))?;
        if file.episodes.len() != file.scores.len() {
            return Err(FlapqError::MalformedSession(format!(
                "{} episodes but {} scores",
                file.episodes.len(),
                file.scores.len()
            ))
            .into());
        }
        if file.episodes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(
                FlapqError::MalformedSession("episodes are not increasing".to_string()).into(),
            );
        }

        let session = Self {
            episode: file.episodes.last().copied().unwrap_or(0),
            max_score: file.scores.iter().copied().max().unwrap_or(0),
            scores: file.scores,
        };
        info!("Loaded training session at episode {} from {:?}", session.episode, path);
        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_bookkeeping() {
        let mut session = TrainingSession::new();
        assert_eq!(session.mean_recent(10), None);
        for score in [3, 0, 12, 5].iter() {
            session.record_episode(*score);
        }
        assert_eq!(session.episode(), 4);
        assert_eq!(session.max_score(), 12);
        assert_eq!(session.mean_recent(2), Some(8.5));
        assert_eq!(session.mean_recent(100), Some(5.0));
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let dir = TempDir::new("session")?;
        let path = dir.path().join(SESSION_FILE);
        let mut session = TrainingSession::new();
        for score in [1, 7, 2].iter() {
            session.record_episode(*score);
        }
        session.save(&path)?;

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
        assert_eq!(json["episodes"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["scores"], serde_json::json!([1, 7, 2]));

        assert_eq!(TrainingSession::load(&path)?, Some(session));
        Ok(())
    }

    #[test]
    fn test_cold_start_and_malformed() -> Result<()> {
        let dir = TempDir::new("session")?;
        let path = dir.path().join(SESSION_FILE);
        assert_eq!(TrainingSession::load(&path)?, None);

        fs::write(&path, r#"{"episodes": [1, 2], "scores": [3]}"#)?;
        assert!(TrainingSession::load(&path).is_err());
        fs::write(&path, r#"{"episodes": [1, 2], "scores": [3, "x"]}"#)?;
        assert!(TrainingSession::load(&path).is_err());
        fs::write(&path, r#"{"episodes": [2, 1], "scores": [3, 4]}"#)?;
        assert!(TrainingSession::load(&path).is_err());

        fs::write(&path, r#"{"episodes": [], "scores": []}"#)?;
        assert_eq!(TrainingSession::load(&path)?, Some(TrainingSession::new()));
        Ok(())
    }
}
