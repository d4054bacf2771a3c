//! Dense Q-table indexed by bucket coordinates.
//!
//! JSON knows mappings and sequences only, so a dense table is persisted through
//! [`DenseSnapshot`]: the layout, the shape and the arrays flattened in row-major
//! order. Loading reshapes the flat data and refuses any length mismatch.
use super::{file::write_atomic, ActionValues, QStore};
use crate::State;
use anyhow::Result;
use flapq_core::error::FlapqError;
use log::{info, warn};
use ndarray::{Array4, Array5};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Equally spaced coordinates of one axis: `min, min + step, ..., min + (len - 1) * step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AxisSpec {
    /// Smallest coordinate.
    pub min: i32,

    /// Distance between coordinates.
    pub step: i32,

    /// Number of coordinates.
    pub len: usize,
}

impl AxisSpec {
    /// Constructs an axis.
    pub fn new(min: i32, step: i32, len: usize) -> Self {
        Self { min, step, len }
    }

    fn index(&self, v: i32) -> Option<usize> {
        let d = i64::from(v) - i64::from(self.min);
        let step = i64::from(self.step);
        if d < 0 || step <= 0 || d % step != 0 {
            return None;
        }
        let ix = (d / step) as usize;
        if ix < self.len {
            Some(ix)
        } else {
            None
        }
    }

    fn value(&self, ix: usize) -> i32 {
        self.min + self.step * ix as i32
    }
}

/// Axes of a [`DenseQTable`], one per state component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DenseLayout {
    /// Horizontal offset axis.
    pub x0: AxisSpec,

    /// Vertical offset axis.
    pub y0: AxisSpec,

    /// Velocity axis.
    pub vel: AxisSpec,

    /// Lookahead vertical offset axis.
    pub y1: AxisSpec,
}

impl DenseLayout {
    /// Constructs a layout.
    pub fn new(x0: AxisSpec, y0: AxisSpec, vel: AxisSpec, y1: AxisSpec) -> Self {
        Self { x0, y0, vel, y1 }
    }

    fn shape(&self) -> (usize, usize, usize, usize) {
        (self.x0.len, self.y0.len, self.vel.len, self.y1.len)
    }

    fn index(&self, s: &State) -> Result<[usize; 4], FlapqError> {
        match (
            self.x0.index(s.x0),
            self.y0.index(s.y0),
            self.vel.index(s.vel),
            self.y1.index(s.y1),
        ) {
            (Some(i), Some(j), Some(k), Some(l)) => Ok([i, j, k, l]),
            _ => Err(FlapqError::StateOutOfBounds(s.to_string())),
        }
    }

    fn state(&self, (i, j, k, l): (usize, usize, usize, usize)) -> State {
        State::new(
            self.x0.value(i),
            self.y0.value(j),
            self.vel.value(k),
            self.y1.value(l),
        )
    }
}

/// Flattened form of a [`DenseQTable`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DenseSnapshot {
    /// Axes of the table.
    pub layout: DenseLayout,

    /// Shape of `values`, the last axis holds `[noop, flap, visits]`.
    pub shape: Vec<usize>,

    /// Values in row-major order.
    pub values: Vec<f64>,

    /// Occupancy of every cell in row-major order.
    pub occupied: Vec<bool>,
}

/// Q-table backed by a dense array over bucket coordinates.
///
/// Memory grows with the product of the axis lengths, so layouts should cover
/// only the region the agent actually visits. States outside the layout are
/// rejected with [`FlapqError::StateOutOfBounds`].
#[derive(Clone, Debug)]
pub struct DenseQTable {
    layout: DenseLayout,
    values: Array5<f64>,
    occupied: Array4<bool>,
    n_occupied: usize,
}

impl DenseQTable {
    /// Constructs an empty table.
    pub fn new(layout: DenseLayout) -> Self {
        let (a, b, c, d) = layout.shape();
        Self {
            layout,
            values: Array5::zeros((a, b, c, d, 3)),
            occupied: Array4::from_elem((a, b, c, d), false),
            n_occupied: 0,
        }
    }

    /// Layout of the table.
    pub fn layout(&self) -> &DenseLayout {
        &self.layout
    }

    /// Flattens the table.
    pub fn to_snapshot(&self) -> DenseSnapshot {
        DenseSnapshot {
            layout: self.layout,
            shape: self.values.shape().to_vec(),
            values: self.values.iter().copied().collect(),
            occupied: self.occupied.iter().copied().collect(),
        }
    }

    /// Reshapes a snapshot into a table.
    pub fn from_snapshot(snapshot: DenseSnapshot) -> Result<Self, FlapqError> {
        let (a, b, c, d) = snapshot.layout.shape();
        if snapshot.shape != [a, b, c, d, 3] {
            return Err(FlapqError::MalformedTable(format!(
                "dense shape {:?} does not match the layout",
                snapshot.shape
            )));
        }
        let values = Array5::from_shape_vec((a, b, c, d, 3), snapshot.values)
            .map_err(|e| FlapqError::MalformedTable(format!("dense values: {}", e)))?;
        let occupied = Array4::from_shape_vec((a, b, c, d), snapshot.occupied)
            .map_err(|e| FlapqError::MalformedTable(format!("dense occupancy: {}", e)))?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FlapqError::MalformedTable(
                "dense values must be finite".to_string(),
            ));
        }
        let n_occupied = occupied.iter().filter(|o| **o).count();

        Ok(Self {
            layout: snapshot.layout,
            values,
            occupied,
            n_occupied,
        })
    }

    /// Saves the snapshot of the table as JSON.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(&self.to_snapshot())?;
        write_atomic(path, &json)?;
        info!("Saved dense Q-table with {} states into {:?}", self.n_occupied, path);
        Ok(())
    }

    /// Loads a table saved with [`DenseQTable::save_snapshot`].
    ///
    /// Returns `Ok(None)` if the file cannot be read.
    pub fn load_snapshot(path: &Path) -> Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read dense Q-table {:?} ({}), starting from scratch", path, e);
                return Ok(None);
            }
        };
        let snapshot: DenseSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| FlapqError::MalformedTable(e.to_string()))?;
        Ok(Some(Self::from_snapshot(snapshot)?))
    }
}

impl QStore for DenseQTable {
    fn get(&self, state: &State) -> Option<ActionValues> {
        let [i, j, k, l] = self.layout.index(state).ok()?;
        if !self.occupied[[i, j, k, l]] {
            return None;
        }
        Some(ActionValues::new(
            self.values[[i, j, k, l, 0]],
            self.values[[i, j, k, l, 1]],
            self.values[[i, j, k, l, 2]] as u64,
        ))
    }

    fn ensure(&mut self, state: &State) -> Result<bool> {
        let [i, j, k, l] = self.layout.index(state)?;
        if self.occupied[[i, j, k, l]] {
            return Ok(false);
        }
        self.occupied[[i, j, k, l]] = true;
        self.n_occupied += 1;
        for m in 0..3 {
            self.values[[i, j, k, l, m]] = 0.0;
        }
        Ok(true)
    }

    fn accepts(&self, state: &State) -> bool {
        self.layout.index(state).is_ok()
    }

    fn set(&mut self, state: &State, values: ActionValues) -> Result<()> {
        let [i, j, k, l] = self.layout.index(state)?;
        if !self.occupied[[i, j, k, l]] {
            self.occupied[[i, j, k, l]] = true;
            self.n_occupied += 1;
        }
        self.values[[i, j, k, l, 0]] = values.noop;
        self.values[[i, j, k, l, 1]] = values.flap;
        self.values[[i, j, k, l, 2]] = values.visits as f64;
        Ok(())
    }

    fn len(&self) -> usize {
        self.n_occupied
    }

    fn clear(&mut self) {
        self.values.fill(0.0);
        self.occupied.fill(false);
        self.n_occupied = 0;
    }

    fn entries(&self) -> Vec<(State, ActionValues)> {
        self.occupied
            .indexed_iter()
            .filter(|(_, o)| **o)
            .map(|((i, j, k, l), _)| {
                (
                    self.layout.state((i, j, k, l)),
                    ActionValues::new(
                        self.values[[i, j, k, l, 0]],
                        self.values[[i, j, k, l, 1]],
                        self.values[[i, j, k, l, 2]] as u64,
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn layout() -> DenseLayout {
        DenseLayout::new(
            AxisSpec::new(-50, 1, 60),
            AxisSpec::new(-60, 10, 13),
            AxisSpec::new(-10, 1, 21),
            AxisSpec::new(-60, 10, 13),
        )
    }

    #[test]
    fn test_axis_index() {
        let axis = AxisSpec::new(-60, 10, 13);
        assert_eq!(axis.index(-60), Some(0));
        assert_eq!(axis.index(60), Some(12));
        assert_eq!(axis.index(70), None);
        assert_eq!(axis.index(-55), None);
        assert_eq!(axis.index(-70), None);
        assert_eq!(axis.value(3), -30);
    }

    #[test]
    fn test_lazy_initialization_and_bounds() -> Result<()> {
        let mut table = DenseQTable::new(layout());
        let s = State::new(-45, 30, -9, 0);
        assert!(table.get(&s).is_none());
        assert!(table.ensure(&s)?);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&s), Some(ActionValues::default()));

        let outside = State::new(300, 0, 0, 0);
        assert!(table.accepts(&s));
        assert!(!table.accepts(&outside));
        assert!(table.ensure(&outside).is_err());
        assert!(table.get(&outside).is_none());
        Ok(())
    }

    #[test]
    fn test_entries_map_back_to_states() -> Result<()> {
        let mut table = DenseQTable::new(layout());
        let s = State::new(0, -60, 10, 60);
        table.set(&s, ActionValues::new(-12.5, -700.0, 4))?;
        assert_eq!(table.entries(), vec![(s, ActionValues::new(-12.5, -700.0, 4))]);
        Ok(())
    }

    #[test]
    fn test_snapshot_reshape() -> Result<()> {
        let dir = TempDir::new("dense_table")?;
        let path = dir.path().join("dense.json");

        let mut table = DenseQTable::new(layout());
        table.set(&State::new(-41, 0, 1, 0), ActionValues::new(0.1, -950.25, 7))?;
        table.ensure(&State::new(9, 10, -3, -10))?;
        table.save_snapshot(&path)?;

        let loaded = DenseQTable::load_snapshot(&path)?.unwrap();
        assert_eq!(loaded.len(), 2);
        let mut expected = table.entries();
        let mut actual = loaded.entries();
        expected.sort_by_key(|(s, _)| *s);
        actual.sort_by_key(|(s, _)| *s);
        assert_eq!(expected, actual);
        Ok(())
    }

    #[test]
    fn test_snapshot_length_mismatch_is_fatal() {
        let mut snapshot = DenseQTable::new(layout()).to_snapshot();
        snapshot.values.pop();
        assert!(DenseQTable::from_snapshot(snapshot).is_err());
    }
}
