//! Backward credit assignment over the moves of an episode.
//!
//! Nearly every tick of an episode is harmless, so rewards are not given for
//! surviving. When the agent dies, the moves are replayed from the most recent
//! one backward and only the moves judged responsible receive the death
//! penalty:
//!
//! * the two moves right before death, whatever they were;
//! * the most recent flap before those two, unless one of them was a flap;
//! * when the agent died high (flew into the upper obstacle), the most recent
//!   flap before the two last moves even if one of them was a flap.
//!
//! At most one move outside of the last two is penalized.
use super::config::Rewards;
use crate::{table::QStore, Action, State};
use anyhow::Result;

/// One tick of an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// State the action was taken in.
    pub state: State,

    /// Action taken.
    pub action: Action,

    /// State observed at the next tick.
    pub next_state: State,
}

impl Transition {
    /// Constructs a transition.
    pub fn new(state: State, action: Action, next_state: State) -> Self {
        Self {
            state,
            action,
            next_state,
        }
    }
}

/// Decides the reward of every move of a finished episode.
#[derive(Clone, Debug)]
pub struct CreditAssigner {
    rewards: Rewards,
    high_death_threshold: i32,
}

impl CreditAssigner {
    /// Constructs the assigner.
    ///
    /// A death is "high" when the vertical offset of the last observed state
    /// exceeds `high_death_threshold`.
    pub fn new(rewards: Rewards, high_death_threshold: i32) -> Self {
        Self {
            rewards,
            high_death_threshold,
        }
    }

    /// Returns `true` if the episode ended with a death in the upper region.
    pub fn is_high_death(&self, moves: &[Transition]) -> bool {
        moves
            .last()
            .map_or(false, |m| m.next_state.y0 > self.high_death_threshold)
    }

    /// Rewards of `moves`, given oldest first, in replay order: element `i` is the
    /// reward of `moves[moves.len() - 1 - i]`.
    pub fn rewards(&self, moves: &[Transition]) -> Vec<f64> {
        let mut high_death = self.is_high_death(moves);
        let mut last_flap = true;

        moves
            .iter()
            .rev()
            .enumerate()
            .map(|(i, m)| {
                let flapped = m.action.is_active();
                if i < 2 {
                    if flapped {
                        last_flap = false;
                    }
                    self.rewards.death
                } else if (last_flap || high_death) && flapped {
                    last_flap = false;
                    high_death = false;
                    self.rewards.death
                } else {
                    self.rewards.neutral
                }
            })
            .collect()
    }
}

/// Applies the Q-learning rule to one transition and counts the visit.
///
/// `Q(s, a) <- (1 - alpha) * Q(s, a) + alpha * (reward + discount * max_a' Q(s', a'))`
pub fn q_update<S: QStore + ?Sized>(
    table: &mut S,
    transition: &Transition,
    reward: f64,
    alpha: f64,
    discount_factor: f64,
) -> Result<()> {
    let next_max = table.values(&transition.next_state)?.max_q();
    let mut values = table.values(&transition.state)?;
    let q = values.q(transition.action);
    values.visits += 1;
    values.set_q(
        transition.action,
        (1.0 - alpha) * q + alpha * (reward + discount_factor * next_max),
    );
    table.set(&transition.state, values)
}
