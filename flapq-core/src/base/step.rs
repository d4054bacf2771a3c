//! Environment step.
use super::Env;

/// Represents the outcome of one tick: the action taken, the next observation
/// and the running score of the episode.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation after the action.
    pub obs: E::Obs,

    /// Score of the episode so far.
    pub score: u64,

    /// Flag denoting if the agent died.
    pub is_terminated: bool,

    /// Flag denoting if the episode was cut short, for example by a score cap.
    pub is_truncated: bool,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        score: u64,
        is_terminated: bool,
        is_truncated: bool,
    ) -> Self {
        Step {
            act,
            obs,
            score,
            is_terminated,
            is_truncated,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
