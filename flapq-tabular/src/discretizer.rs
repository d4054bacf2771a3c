//! Discretization of game observations into table states.
//!
//! Offsets to the obstacles are bucketed with widths that grow with the
//! distance from the agent: precision matters right after passing an obstacle
//! and hardly at all when it is far away.
use anyhow::Result;
use flapq_core::error::FlapqError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::TryFrom, fmt, str::FromStr};

/// Position of an obstacle pair (the gap between a top and a bottom pipe).
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct PipePair {
    /// Horizontal position.
    pub x: f64,

    /// Vertical position.
    pub y: f64,
}

impl PipePair {
    /// Constructs a pipe pair.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What the agent sees at one tick.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Observation {
    /// Horizontal position of the agent.
    pub x: f64,

    /// Vertical position of the agent.
    pub y: f64,

    /// Vertical velocity of the agent.
    pub vel: i32,

    /// Upcoming obstacle pairs, nearest first. At least two are required.
    pub pipes: Vec<PipePair>,
}

impl Observation {
    /// Constructs an observation.
    pub fn new(x: f64, y: f64, vel: i32, pipes: Vec<PipePair>) -> Self {
        Self { x, y, vel, pipes }
    }
}

impl flapq_core::Obs for Observation {}

impl AsRef<Observation> for Observation {
    fn as_ref(&self) -> &Observation {
        self
    }
}

/// One of the two moves available to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Action {
    /// Do nothing, let gravity act.
    Noop,

    /// Flap.
    Flap,
}

impl Action {
    /// Index of the action in a value vector: 0 for [`Action::Noop`], 1 for [`Action::Flap`].
    pub fn index(self) -> usize {
        match self {
            Action::Noop => 0,
            Action::Flap => 1,
        }
    }

    /// Returns `true` for [`Action::Flap`].
    pub fn is_active(self) -> bool {
        self == Action::Flap
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Noop
    }
}

impl From<Action> for i32 {
    fn from(a: Action) -> Self {
        a.index() as i32
    }
}

impl flapq_core::Act for Action {}

/// Discretized state: bucketed offsets to the obstacles and the velocity.
///
/// The textual form `"{x0}_{y0}_{vel}_{y1}"` is the key of the persisted table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    /// Horizontal offset to the active obstacle pair.
    pub x0: i32,

    /// Vertical offset to the active obstacle pair.
    pub y0: i32,

    /// Vertical velocity.
    pub vel: i32,

    /// Vertical offset to the following obstacle pair, 0 outside of the lookahead window.
    pub y1: i32,
}

impl State {
    /// Constructs a state from already bucketed values.
    pub fn new(x0: i32, y0: i32, vel: i32, y1: i32) -> Self {
        Self { x0, y0, vel, y1 }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.x0, self.y0, self.vel, self.y1)
    }
}

impl FromStr for State {
    type Err = FlapqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FlapqError::MalformedTable(format!("invalid state key {:?}", s));
        let parts = s
            .split('_')
            .map(|p| p.parse::<i32>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [x0, y0, vel, y1] => Ok(State::new(*x0, *y0, *vel, *y1)),
            _ => Err(err()),
        }
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Bucketing constants of [`Discretizer`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DiscretizerConfig {
    /// The agent moves on to the next obstacle pair once it is this far past the nearest one.
    pub pass_margin: f64,

    /// Width of the window before an obstacle pair in which the following pair is looked at.
    pub lookahead_window: f64,

    /// Horizontal offsets below this value are not bucketed.
    pub x_fine_from: f64,

    /// Horizontal offsets from this value on use the coarse bucket width.
    pub x_coarse_from: f64,

    /// Horizontal bucket width near the obstacle.
    pub x_fine_step: i64,

    /// Horizontal bucket width far from the obstacle.
    pub x_coarse_step: i64,

    /// Vertical offsets strictly inside `(-y_band, y_band)` use the fine bucket width.
    pub y_band: f64,

    /// Vertical bucket width inside the band.
    pub y_fine_step: i64,

    /// Vertical bucket width outside the band.
    pub y_coarse_step: i64,
}

impl Default for DiscretizerConfig {
    fn default() -> Self {
        Self {
            pass_margin: 50.0,
            lookahead_window: 50.0,
            x_fine_from: -40.0,
            x_coarse_from: 140.0,
            x_fine_step: 10,
            x_coarse_step: 70,
            y_band: 180.0,
            y_fine_step: 10,
            y_coarse_step: 60,
        }
    }
}

/// Largest multiple of `step` not greater than `v`.
fn floor_to(v: i64, step: i64) -> i64 {
    v - v.rem_euclid(step)
}

fn narrow(v: i64) -> Result<i32, FlapqError> {
    i32::try_from(v).map_err(|_| FlapqError::ObservationOutOfRange(v))
}

/// Maps observations to states. A pure function of the observation.
#[derive(Clone, Debug, Default)]
pub struct Discretizer {
    config: DiscretizerConfig,
}

impl Discretizer {
    /// Constructs a discretizer.
    pub fn new(config: DiscretizerConfig) -> Self {
        Self { config }
    }

    /// Configuration of the discretizer.
    pub fn config(&self) -> &DiscretizerConfig {
        &self.config
    }

    /// Discretizes an observation.
    ///
    /// # Errors
    ///
    /// Fails with [`FlapqError::InsufficientObstacles`] if the observation carries
    /// less than two obstacle pairs, and with [`FlapqError::ObservationOutOfRange`]
    /// if a bucketed offset does not fit in an `i32`.
    pub fn discretize(&self, obs: &Observation) -> Result<State, FlapqError> {
        let pipes = &obs.pipes;
        if pipes.len() < 2 {
            return Err(FlapqError::InsufficientObstacles(pipes.len()));
        }

        let (pipe0, pipe1) = if obs.x - pipes[0].x >= self.config.pass_margin {
            (pipes[1], *pipes.get(2).unwrap_or(&pipes[1]))
        } else {
            (pipes[0], pipes[1])
        };

        let x0 = pipe0.x - obs.x;
        let y0 = pipe0.y - obs.y;
        let y1 = if -self.config.lookahead_window < x0 && x0 <= 0.0 {
            pipe1.y - obs.y
        } else {
            0.0
        };

        Ok(State::new(
            narrow(self.bucket_x(x0))?,
            narrow(self.bucket_y(y0))?,
            obs.vel,
            narrow(self.bucket_y(y1))?,
        ))
    }

    fn bucket_x(&self, x0: f64) -> i64 {
        let c = &self.config;
        let v = x0 as i64;
        if x0 < c.x_fine_from {
            v
        } else if x0 < c.x_coarse_from {
            floor_to(v, c.x_fine_step)
        } else {
            floor_to(v, c.x_coarse_step)
        }
    }

    fn bucket_y(&self, y: f64) -> i64 {
        let c = &self.config;
        let v = y as i64;
        if -c.y_band < y && y < c.y_band {
            floor_to(v, c.y_fine_step)
        } else {
            floor_to(v, c.y_coarse_step)
        }
    }
}
