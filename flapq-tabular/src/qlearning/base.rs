//! Q-learning agent.
use super::{
    config::{QLearnerConfig, Rewards},
    decay::LrDecay,
    explorer::Explorer,
    replay::{q_update, CreditAssigner, Transition},
    session::{TrainingSession, SESSION_FILE},
};
use crate::{
    table::{load_table, save_table, QStore, Q_TABLE_FILE},
    Action, Discretizer, Observation, SparseQTable, State,
};
use anyhow::Result;
use flapq_core::{
    error::FlapqError,
    record::{Record, RecordValue},
    Agent, Configurable, Env, Policy,
};
use log::{debug, info};
use rand::{rngs::SmallRng, SeedableRng};
use std::{collections::VecDeque, fs, path::Path};

/// Tabular Q-learning agent.
///
/// The agent records one [`Transition`] per tick while training and learns
/// only when the episode ends, by replaying the moves backward (see
/// [`CreditAssigner`]). The table strategy is chosen with `S`.
pub struct QLearner<S: QStore = SparseQTable> {
    discretizer: Discretizer,
    table: S,
    session: TrainingSession,
    moves: VecDeque<Transition>,
    previous: Option<(State, Action)>,
    train: bool,
    alpha0: f64,
    alpha: f64,
    lr_decay: LrDecay,
    discount_factor: f64,
    explorer: Explorer,
    credit: CreditAssigner,
    rewards: Rewards,
    max_moves: usize,
    rng: SmallRng,
}

impl<S: QStore> QLearner<S> {
    /// Builds the agent on a given table.
    pub fn build_with_table(config: QLearnerConfig, table: S) -> Result<Self> {
        config.validate()?;
        let QLearnerConfig {
            train,
            discount_factor,
            alpha,
            lr_decay,
            explorer,
            rewards,
            max_moves,
            high_death_threshold,
            seed,
            discretizer,
        } = config;

        Ok(Self {
            discretizer: Discretizer::new(discretizer),
            table,
            session: TrainingSession::new(),
            moves: VecDeque::new(),
            previous: None,
            train,
            alpha0: alpha,
            alpha: lr_decay.alpha(alpha, 0),
            lr_decay,
            discount_factor,
            explorer,
            credit: CreditAssigner::new(rewards.clone(), high_death_threshold),
            rewards,
            max_moves,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Discretizes an observation and makes sure its state is in the table.
    pub fn discretize(&mut self, obs: &Observation) -> Result<State> {
        let state = self.discretizer.discretize(obs)?;
        self.table.ensure(&state)?;
        Ok(state)
    }

    /// Takes an action for the current tick.
    ///
    /// In training mode the move from the previous tick is recorded first.
    pub fn act(&mut self, obs: &Observation) -> Result<Action> {
        let state = self.discretize(obs)?;

        if self.train {
            if let Some((prev_state, prev_action)) = self.previous {
                self.moves
                    .push_back(Transition::new(prev_state, prev_action, state));
                if self.moves.len() > self.max_moves {
                    self.flush_excess()?;
                }
            }
        }

        let values = self.table.values(&state)?;
        let action = if self.train {
            self.explorer
                .action(&values, self.session.episode(), &mut self.rng)
        } else {
            values.greedy()
        };
        self.previous = Some((state, action));

        Ok(action)
    }

    /// Learns from the oldest moves beyond `max_moves` with the neutral reward and forgets them.
    fn flush_excess(&mut self) -> Result<()> {
        let n = self.moves.len().saturating_sub(self.max_moves);
        let evicted: Vec<Transition> = self.moves.drain(..n).collect();
        for t in evicted.iter().rev() {
            q_update(
                &mut self.table,
                t,
                self.rewards.neutral,
                self.alpha,
                self.discount_factor,
            )?;
        }
        debug!("Flushed {} moves, {} kept in memory", n, self.moves.len());
        Ok(())
    }

    /// Closes an episode: bookkeeping, then the backward replay when training.
    pub fn end_episode(&mut self, score: u64) -> Result<Record> {
        self.session.record_episode(score);
        let n_moves = self.moves.len();

        if self.train {
            let moves: Vec<Transition> = self.moves.drain(..).collect();
            let rewards = self.credit.rewards(&moves);
            for (t, reward) in moves.iter().rev().zip(rewards.iter()) {
                q_update(
                    &mut self.table,
                    t,
                    *reward,
                    self.alpha,
                    self.discount_factor,
                )?;
            }
            self.alpha = self.lr_decay.alpha(self.alpha0, self.session.episode());
        }
        self.moves.clear();
        self.previous = None;

        Ok(Record::from_slice(&[
            ("episode", RecordValue::Scalar(self.session.episode() as f32)),
            ("score", RecordValue::Scalar(score as f32)),
            (
                "max_score",
                RecordValue::Scalar(self.session.max_score() as f32),
            ),
            ("alpha", RecordValue::Scalar(self.alpha as f32)),
            ("epsilon", RecordValue::Scalar(self.epsilon() as f32)),
            ("n_states", RecordValue::Scalar(self.table.len() as f32)),
            ("n_moves", RecordValue::Scalar(n_moves as f32)),
        ]))
    }

    /// Switches between training and evaluation. The pending tick is dropped.
    pub fn set_train(&mut self, train: bool) {
        self.train = train;
        self.previous = None;
    }

    /// The Q-table.
    pub fn table(&self) -> &S {
        &self.table
    }

    /// Episode bookkeeping.
    pub fn session(&self) -> &TrainingSession {
        &self.session
    }

    /// Current learning rate.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Current exploration probability, zero in evaluation mode.
    pub fn epsilon(&self) -> f64 {
        if self.train {
            self.explorer.epsilon(self.session.episode())
        } else {
            0.0
        }
    }

    /// Number of moves of the current episode kept in memory.
    pub fn n_moves(&self) -> usize {
        self.moves.len()
    }

    fn save_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        save_table(&self.table, &path.join(Q_TABLE_FILE))?;
        self.session.save(&path.join(SESSION_FILE))?;
        Ok(())
    }

    fn load_dir(&mut self, path: &Path) -> Result<()> {
        // Both files are parsed before anything is replaced.
        let entries = load_table(&path.join(Q_TABLE_FILE))?;
        let session = TrainingSession::load(&path.join(SESSION_FILE))?;

        if let Some(entries) = entries {
            if let Some((state, _)) = entries.iter().find(|(s, _)| !self.table.accepts(s)) {
                return Err(FlapqError::StateOutOfBounds(state.to_string()).into());
            }
            self.table.clear();
            for (state, values) in entries.iter() {
                self.table.set(state, *values)?;
            }
        }
        if let Some(session) = session {
            self.session = session;
        }
        self.alpha = self.lr_decay.alpha(self.alpha0, self.session.episode());
        self.moves.clear();
        self.previous = None;
        info!(
            "Resumed at episode {} with {} states, alpha = {}",
            self.session.episode(),
            self.table.len(),
            self.alpha
        );
        Ok(())
    }
}

impl<S: QStore + Default> Configurable for QLearner<S> {
    type Config = QLearnerConfig;

    fn build(config: Self::Config) -> Result<Self> {
        Self::build_with_table(config, S::default())
    }
}

impl<E, S> Policy<E> for QLearner<S>
where
    E: Env,
    S: QStore,
    E::Obs: AsRef<Observation>,
    E::Act: From<Action>,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        Ok(self.act(obs.as_ref())?.into())
    }
}

impl<E, S> Agent<E> for QLearner<S>
where
    E: Env,
    S: QStore,
    E::Obs: AsRef<Observation>,
    E::Act: From<Action>,
{
    fn train(&mut self) {
        self.set_train(true);
    }

    fn eval(&mut self) {
        self.set_train(false);
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn update(&mut self, score: u64) -> Result<Record> {
        self.end_episode(score)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        self.save_dir(path)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.load_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{table::ActionValues, AxisSpec, DenseLayout, DenseQTable, PipePair};
    use tempdir::TempDir;

    fn obs(x: f64, y: f64, vel: i32) -> Observation {
        Observation::new(x, y, vel, vec![PipePair::new(0.0, 0.0), PipePair::new(200.0, 0.0)])
    }

    fn learner() -> QLearner {
        QLearner::build(QLearnerConfig::default()).unwrap()
    }

    #[test]
    fn test_tie_is_passive() -> Result<()> {
        let mut agent = learner();
        agent.set_train(false);
        assert_eq!(agent.act(&obs(-100.0, 0.0, 0))?, Action::Noop);
        Ok(())
    }

    #[test]
    fn test_new_state_is_initialized_once() -> Result<()> {
        let mut agent = learner();
        let s = agent.discretize(&obs(-100.0, 0.0, 0))?;
        agent.discretize(&obs(-100.0, 0.0, 0))?;
        assert_eq!(agent.table().len(), 1);
        assert_eq!(agent.table().get(&s), Some(ActionValues::default()));
        Ok(())
    }

    #[test]
    fn test_first_tick_records_no_move() -> Result<()> {
        let mut agent = learner();
        agent.act(&obs(-100.0, 0.0, 0))?;
        assert_eq!(agent.n_moves(), 0);
        agent.act(&obs(-95.0, 0.0, 1))?;
        agent.act(&obs(-90.0, 0.0, 2))?;
        assert_eq!(agent.n_moves(), 2);
        Ok(())
    }

    #[test]
    fn test_update_without_moves_advances_episode() -> Result<()> {
        let mut agent = learner();
        let record = agent.end_episode(7)?;
        assert_eq!(agent.session().episode(), 1);
        assert_eq!(agent.session().max_score(), 7);
        assert!(agent.table().is_empty());
        assert_eq!(record.get_scalar("episode")?, 1.0);
        assert_eq!(record.get_scalar("n_moves")?, 0.0);
        Ok(())
    }

    #[test]
    fn test_eval_does_not_learn() -> Result<()> {
        let mut agent = learner();
        agent.set_train(false);
        for i in 0..10 {
            agent.act(&obs(-100.0 + 5.0 * i as f64, 0.0, i))?;
        }
        let mut before = agent.table().entries();
        agent.end_episode(0)?;
        assert_eq!(agent.n_moves(), 0);
        assert_eq!(agent.session().episode(), 1);
        let mut after = agent.table().entries();
        before.sort_by_key(|(s, _)| *s);
        after.sort_by_key(|(s, _)| *s);
        assert_eq!(before, after);
        assert!(after.iter().all(|(_, v)| *v == ActionValues::default()));
        Ok(())
    }

    #[test]
    fn test_eval_keeps_learning_rate() -> Result<()> {
        let config = QLearnerConfig::default().lr_decay(LrDecay::Hyperbolic {
            rate: 1.0,
            floor: 0.01,
        });
        let mut agent: QLearner = QLearner::build(config)?;
        agent.end_episode(0)?;
        let alpha = agent.alpha();
        agent.set_train(false);
        for _ in 0..3 {
            agent.act(&obs(-100.0, 0.0, 0))?;
            let record = agent.end_episode(0)?;
            assert_eq!(record.get_scalar("alpha")?, alpha as f32);
        }
        assert_eq!(agent.session().episode(), 4);
        assert_eq!(agent.alpha(), alpha);

        agent.set_train(true);
        agent.end_episode(0)?;
        assert!(agent.alpha() < alpha);
        Ok(())
    }

    #[test]
    fn test_memory_bound() -> Result<()> {
        let mut agent: QLearner =
            QLearner::build(QLearnerConfig::default().max_moves(3))?;
        for i in 0..10 {
            agent.act(&obs(-100.0 + 10.0 * i as f64, 0.0, 0))?;
            assert!(agent.n_moves() <= 3);
        }
        assert_eq!(agent.n_moves(), 3);

        // The six flushed moves were learned from with the neutral reward.
        let visits: u64 = agent.table().entries().iter().map(|(_, v)| v.visits).sum();
        assert_eq!(visits, 6);
        assert!(agent
            .table()
            .entries()
            .iter()
            .all(|(_, v)| v.noop == 0.0 && v.flap == 0.0));
        Ok(())
    }

    #[test]
    fn test_death_penalizes_last_moves() -> Result<()> {
        let mut agent = learner();
        let states: Vec<State> = (0..5)
            .map(|i| {
                let o = obs(-100.0 + 10.0 * i as f64, 0.0, 0);
                agent.act(&o)?;
                agent.discretize(&o)
            })
            .collect::<Result<_>>()?;
        agent.end_episode(0)?;

        // Greedy noop moves: only the two last ones get the death penalty.
        let penalized = -0.7 * 1000.0;
        let noop = |s: &State| agent.table().get(s).unwrap().noop;
        assert!((noop(&states[3]) - penalized).abs() < 1e-9);
        assert!((noop(&states[2]) - penalized).abs() < 1e-9);
        assert_eq!(noop(&states[1]), 0.0);
        assert_eq!(noop(&states[0]), 0.0);
        assert_eq!(agent.table().get(&states[4]).unwrap().visits, 0);
        assert_eq!(agent.n_moves(), 0);
        Ok(())
    }

    #[test]
    fn test_insufficient_pipes_is_error() {
        let mut agent = learner();
        let o = Observation::new(0.0, 0.0, 0, vec![PipePair::new(10.0, 0.0)]);
        assert!(agent.act(&o).is_err());
        assert!(agent.table().is_empty());
    }

    #[test]
    fn test_save_and_resume() -> Result<()> {
        let dir = TempDir::new("q_learner")?;
        let config = QLearnerConfig::default().lr_decay(LrDecay::Linear {
            rate: 0.1,
            floor: 0.1,
        });
        let mut agent: QLearner = QLearner::build(config.clone())?;
        for score in 0..3 {
            for i in 0..4 {
                agent.act(&obs(-100.0 + 10.0 * i as f64, 0.0, i))?;
            }
            agent.end_episode(score)?;
        }
        agent.save_dir(dir.path())?;
        assert!(dir.path().join(Q_TABLE_FILE).exists());
        assert!(dir.path().join(SESSION_FILE).exists());

        let mut resumed: QLearner = QLearner::build(config)?;
        resumed.load_dir(dir.path())?;
        assert_eq!(resumed.session(), agent.session());
        assert!((resumed.alpha() - agent.alpha()).abs() < 1e-12);
        let mut expected = agent.table().entries();
        let mut actual = resumed.table().entries();
        expected.sort_by_key(|(s, _)| *s);
        actual.sort_by_key(|(s, _)| *s);
        assert_eq!(expected, actual);
        Ok(())
    }

    #[test]
    fn test_missing_files_are_cold_start() -> Result<()> {
        let dir = TempDir::new("q_learner")?;
        let mut agent = learner();
        agent.load_dir(dir.path())?;
        assert_eq!(agent.session().episode(), 0);
        assert!(agent.table().is_empty());

        fs::write(dir.path().join(Q_TABLE_FILE), "not json")?;
        assert!(agent.load_dir(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_dense_table_strategy() -> Result<()> {
        let layout = DenseLayout::new(
            AxisSpec::new(-140, 10, 30),
            AxisSpec::new(-240, 10, 49),
            AxisSpec::new(-10, 1, 21),
            AxisSpec::new(-240, 10, 49),
        );
        let mut agent =
            QLearner::build_with_table(QLearnerConfig::default(), DenseQTable::new(layout))?;
        for i in 0..5 {
            agent.act(&obs(-100.0 + 10.0 * i as f64, 0.0, 0))?;
        }
        agent.end_episode(0)?;
        assert_eq!(agent.table().len(), 5);
        assert!(agent.table().entries().iter().any(|(_, v)| v.noop < 0.0));
        Ok(())
    }

    #[test]
    fn test_dense_load_outside_layout_keeps_table() -> Result<()> {
        let dir = TempDir::new("q_learner")?;
        let layout = DenseLayout::new(
            AxisSpec::new(-140, 10, 30),
            AxisSpec::new(-240, 10, 49),
            AxisSpec::new(-10, 1, 21),
            AxisSpec::new(-240, 10, 49),
        );
        let mut agent =
            QLearner::build_with_table(QLearnerConfig::default(), DenseQTable::new(layout))?;
        let learned = State::new(10, 10, 1, 10);
        agent.table.set(&learned, ActionValues::new(-500.0, 0.0, 3))?;
        let before = agent.table().entries();

        fs::write(
            dir.path().join(Q_TABLE_FILE),
            r#"{"-100_0_0_0": [-1.0, 0.0, 1], "9990_0_0_0": [-2.0, 0.0, 1]}"#,
        )?;
        let err = agent.load_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FlapqError>(),
            Some(FlapqError::StateOutOfBounds(_))
        ));
        assert_eq!(agent.table().entries(), before);
        assert_eq!(agent.session().episode(), 0);
        Ok(())
    }
}
