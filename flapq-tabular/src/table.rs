//! Storage of action values per state.
//!
//! The learner only talks to a table through [`QStore`], so the sparse
//! ([`SparseQTable`]) and dense ([`DenseQTable`]) strategies are interchangeable.
mod dense;
mod file;
mod sparse;
use crate::{Action, State};
use anyhow::Result;
pub use dense::{AxisSpec, DenseLayout, DenseQTable, DenseSnapshot};
pub use file::{load_table, save_table, write_atomic, Q_TABLE_FILE};
pub use sparse::SparseQTable;

/// Action values of one state and the number of times the state was updated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActionValues {
    /// Value of [`Action::Noop`].
    pub noop: f64,

    /// Value of [`Action::Flap`].
    pub flap: f64,

    /// Number of updates of this state.
    pub visits: u64,
}

impl ActionValues {
    /// Constructs action values.
    pub fn new(noop: f64, flap: f64, visits: u64) -> Self {
        Self { noop, flap, visits }
    }

    /// Value of the given action.
    pub fn q(&self, action: Action) -> f64 {
        match action {
            Action::Noop => self.noop,
            Action::Flap => self.flap,
        }
    }

    /// Sets the value of the given action.
    pub fn set_q(&mut self, action: Action, value: f64) {
        match action {
            Action::Noop => self.noop = value,
            Action::Flap => self.flap = value,
        }
    }

    /// The larger of the two action values. The visit count is not a value.
    pub fn max_q(&self) -> f64 {
        self.noop.max(self.flap)
    }

    /// The greedy action. Flapping is chosen only if it is strictly better.
    pub fn greedy(&self) -> Action {
        if self.flap > self.noop {
            Action::Flap
        } else {
            Action::Noop
        }
    }
}

/// Capability of a Q-table.
pub trait QStore {
    /// Action values of `state`, `None` if the state was never initialized.
    fn get(&self, state: &State) -> Option<ActionValues>;

    /// Initializes `state` with zero values unless it already exists.
    ///
    /// Returns `true` if the state was created.
    fn ensure(&mut self, state: &State) -> Result<bool>;

    /// Returns `true` if `state` can be stored in this table.
    fn accepts(&self, _state: &State) -> bool {
        true
    }

    /// Overwrites the values of `state`, creating it if needed.
    fn set(&mut self, state: &State, values: ActionValues) -> Result<()>;

    /// Number of initialized states.
    fn len(&self) -> usize;

    /// Returns `true` if no state is initialized.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every state.
    fn clear(&mut self);

    /// All initialized states with their values, in no particular order.
    fn entries(&self) -> Vec<(State, ActionValues)>;

    /// Action values of `state`, initializing it first if needed.
    fn values(&mut self, state: &State) -> Result<ActionValues> {
        self.ensure(state)?;
        Ok(self.get(state).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_tie_is_passive() {
        assert_eq!(ActionValues::default().greedy(), Action::Noop);
        assert_eq!(ActionValues::new(-5.0, -5.0, 3).greedy(), Action::Noop);
        assert_eq!(ActionValues::new(-5.0, -4.9, 0).greedy(), Action::Flap);
        assert_eq!(ActionValues::new(0.0, -1000.0, 0).greedy(), Action::Noop);
    }

    #[test]
    fn test_max_ignores_visits() {
        let v = ActionValues::new(-3.0, -7.0, 1000);
        assert_eq!(v.max_q(), -3.0);
    }
}
