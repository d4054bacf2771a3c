//! JSON persistence of Q-tables.
//!
//! The file is an object keyed by the textual state, each value being
//! `[q_noop, q_flap, visits]`. Tables written by older tools without the visit
//! count (`[q_noop, q_flap]`) load with zero visits.
use super::{ActionValues, QStore};
use crate::State;
use anyhow::Result;
use flapq_core::error::FlapqError;
use log::{info, warn};
use serde_json::Number;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

/// Name of the Q-table file in a model directory.
pub const Q_TABLE_FILE: &str = "q_values.json";

/// Writes `bytes` to a temporary sibling of `path`, then renames it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Saves the table as JSON.
pub fn save_table<S: QStore + ?Sized>(table: &S, path: &Path) -> Result<()> {
    let q_values: BTreeMap<State, (f64, f64, u64)> = table
        .entries()
        .into_iter()
        .map(|(s, v)| (s, (v.noop, v.flap, v.visits)))
        .collect();
    let json = serde_json::to_vec(&q_values)?;
    write_atomic(path, &json)?;
    info!("Saved Q-table with {} states into {:?}", q_values.len(), path);
    Ok(())
}

fn parse_visits(state: &str, n: &Number) -> Result<u64, FlapqError> {
    if let Some(v) = n.as_u64() {
        return Ok(v);
    }
    match n.as_f64() {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(FlapqError::MalformedTable(format!(
            "visit count of {} is not a non-negative integer: {}",
            state, n
        ))),
    }
}

fn parse_values(state: &str, vs: &[Number]) -> Result<ActionValues, FlapqError> {
    let q = |n: &Number| {
        n.as_f64().ok_or_else(|| {
            FlapqError::MalformedTable(format!("value of {} is out of range: {}", state, n))
        })
    };
    match vs {
        [noop, flap] => Ok(ActionValues::new(q(noop)?, q(flap)?, 0)),
        [noop, flap, visits] => Ok(ActionValues::new(
            q(noop)?,
            q(flap)?,
            parse_visits(state, visits)?,
        )),
        _ => Err(FlapqError::MalformedTable(format!(
            "{} has {} values, expected 2 or 3",
            state,
            vs.len()
        ))),
    }
}

/// Loads a table saved with [`save_table`].
///
/// Returns `Ok(None)` if the file cannot be read, which callers treat as a cold
/// start. Any content that is not a valid table is an error; nothing is loaded
/// partially.
pub fn load_table(path: &Path) -> Result<Option<Vec<(State, ActionValues)>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Cannot read Q-table {:?} ({}), starting from scratch", path, e);
            return Ok(None);
        }
    };

    let raw: HashMap<String, Vec<Number>> = serde_json::from_slice(&bytes)
        .map_err(|e| FlapqError::MalformedTable(e.to_string()))?;

    let mut entries = Vec::with_capacity(raw.len());
    for (key, vs) in raw.iter() {
        let state = key.parse::<State>()?;
        entries.push((state, parse_values(key, vs)?));
    }
    info!("Loaded Q-table with {} states from {:?}", entries.len(), path);

    Ok(Some(entries))
}
