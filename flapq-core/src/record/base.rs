//! Base implementation of records for logging.
//!
//! A record is a bag of named values produced at the end of an episode, an
//! evaluation run or a checkpoint. Recorders decide where the values end up.
use crate::error::FlapqError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like the score.
    Scalar(f32),

    /// A timestamp with local timezone, useful for logging events.
    DateTime(DateTime<Local>),
}

/// A container for storing key-value pairs of various data types.
///
/// # Examples
///
/// ```rust
/// use flapq_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("score", 17.0);
/// record.insert("alpha", RecordValue::Scalar(0.7));
///
/// assert_eq!(record.get_scalar("score").unwrap(), 17.0);
/// assert!(record.get_scalar("epsilon").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges another record into this one in place.
    ///
    /// Values of `record` overwrite values with the same key.
    pub fn merge_inplace(&mut self, record: Record) {
        for (k, v) in record.0.into_iter() {
            self.0.insert(k, v);
        }
    }

    /// Gets a scalar value from the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or the value is not a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, FlapqError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v as _),
                _ => Err(FlapqError::RecordValueTypeError("Scalar".to_string())),
            }
        } else {
            Err(FlapqError::RecordKeyError(k.to_string()))
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_with_second() {
        let mut r = Record::from_slice(&[
            ("score", RecordValue::Scalar(1.0)),
            ("alpha", RecordValue::Scalar(0.7)),
        ]);
        r.merge_inplace(Record::from_scalar("score", 5.0));
        assert_eq!(r.get_scalar("score").unwrap(), 5.0);
        assert_eq!(r.get_scalar("alpha").unwrap(), 0.7);
    }

    #[test]
    fn test_scalar_getter_errors() {
        let mut r = Record::empty();
        r.insert("datetime", RecordValue::DateTime(Local::now()));

        assert!(matches!(
            r.get_scalar("datetime"),
            Err(FlapqError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            r.get_scalar("missing"),
            Err(FlapqError::RecordKeyError(_))
        ));
    }
}
