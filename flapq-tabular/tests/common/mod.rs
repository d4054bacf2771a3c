//! A scripted side-scrolling environment for tests.
#![allow(dead_code)]
use anyhow::Result;
use flapq_core::{record::Record, Env, Step};
use flapq_tabular::{Action, Observation, PipePair};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Horizontal position of the agent, fixed while the pipes scroll.
const AGENT_X: f64 = 100.0;

/// Half width of a pipe.
const PIPE_HALF_WIDTH: f64 = 20.0;

#[derive(Clone, Debug)]
pub struct ToyEnvConfig {
    /// Height of the playfield; the agent dies outside `[0, height]`.
    pub height: f64,

    /// Half height of the gap between a top and a bottom pipe.
    pub gap: f64,

    /// Horizontal distance between pipe pairs.
    pub spacing: f64,

    /// Horizontal distance the pipes scroll per tick.
    pub speed: f64,

    /// Velocity set by a flap. Positive velocities point down.
    pub flap_vel: i32,

    /// Largest downward velocity.
    pub max_vel: i32,
}

impl Default for ToyEnvConfig {
    fn default() -> Self {
        Self {
            height: 400.0,
            gap: 60.0,
            spacing: 200.0,
            speed: 4.0,
            flap_vel: -9,
            max_vel: 10,
        }
    }
}

/// Gravity, flaps and a stream of pipe pairs with random gap heights.
pub struct ToyEnv {
    config: ToyEnvConfig,
    rng: SmallRng,
    y: f64,
    vel: i32,
    pipes: Vec<PipePair>,
    score: u64,
}

impl ToyEnv {
    fn gap_y(&mut self) -> f64 {
        let margin = self.config.gap + 20.0;
        self.rng.gen_range(margin..(self.config.height - margin))
    }

    fn start(&mut self) -> Observation {
        self.y = self.config.height / 2.0;
        self.vel = 0;
        self.score = 0;
        self.pipes.clear();
        for i in 0..3 {
            let y = self.gap_y();
            self.pipes
                .push(PipePair::new(AGENT_X + 200.0 + self.config.spacing * i as f64, y));
        }
        self.observation()
    }

    fn observation(&self) -> Observation {
        Observation::new(AGENT_X, self.y, self.vel, self.pipes.clone())
    }

    fn collides(&self) -> bool {
        if self.y < 0.0 || self.y > self.config.height {
            return true;
        }
        self.pipes.iter().any(|p| {
            (p.x - AGENT_X).abs() <= PIPE_HALF_WIDTH && (self.y - p.y).abs() > self.config.gap
        })
    }
}

impl Env for ToyEnv {
    type Config = ToyEnvConfig;
    type Obs = Observation;
    type Act = Action;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            rng: SmallRng::seed_from_u64(seed as u64),
            y: 0.0,
            vel: 0,
            pipes: vec![],
            score: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        self.vel = match a {
            Action::Flap => self.config.flap_vel,
            Action::Noop => (self.vel + 1).min(self.config.max_vel),
        };
        self.y += self.vel as f64;

        for p in self.pipes.iter_mut() {
            let before = p.x;
            p.x -= self.config.speed;
            if before >= AGENT_X && p.x < AGENT_X {
                self.score += 1;
            }
        }

        // Pipes far behind the agent make room for a new pair at the end.
        if self.pipes[0].x < AGENT_X - 100.0 {
            self.pipes.remove(0);
            let last = self.pipes[self.pipes.len() - 1].x;
            let y = self.gap_y();
            self.pipes.push(PipePair::new(last + self.config.spacing, y));
        }

        let is_terminated = self.collides();
        let step = Step::new(self.observation(), *a, self.score, is_terminated, false);
        (step, Record::empty())
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        Ok(self.start())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = SmallRng::seed_from_u64(ix as u64);
        Ok(self.start())
    }
}
