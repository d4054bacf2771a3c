use super::{ActionValues, QStore};
use crate::State;
use anyhow::Result;
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3Builder;

/// Q-table holding only the states met so far.
#[derive(Clone, Debug, Default)]
pub struct SparseQTable {
    q_values: HashMap<State, ActionValues, Xxh3Builder>,
}

impl SparseQTable {
    /// Constructs an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states updated at least once.
    pub fn n_visited(&self) -> usize {
        self.q_values.values().filter(|v| v.visits > 0).count()
    }
}

impl QStore for SparseQTable {
    fn get(&self, state: &State) -> Option<ActionValues> {
        self.q_values.get(state).copied()
    }

    fn ensure(&mut self, state: &State) -> Result<bool> {
        if self.q_values.contains_key(state) {
            Ok(false)
        } else {
            self.q_values.insert(*state, ActionValues::default());
            Ok(true)
        }
    }

    fn set(&mut self, state: &State, values: ActionValues) -> Result<()> {
        self.q_values.insert(*state, values);
        Ok(())
    }

    fn len(&self) -> usize {
        self.q_values.len()
    }

    fn clear(&mut self) {
        self.q_values.clear();
    }

    fn entries(&self) -> Vec<(State, ActionValues)> {
        self.q_values.iter().map(|(s, v)| (*s, *v)).collect()
    }
}
