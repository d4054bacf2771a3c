//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - The values a [`Record`] can hold
//! * [`Recorder`] - Writes records one by one
//! * [`AggregateRecorder`] - Stores records and writes aggregated values on flush
//! * [`RecordStorage`] - Aggregation of stored records
//! * [`BufferedRecorder`] - Keeps every record in memory
//! * [`LogRecorder`] - Writes aggregated records through the `log` facade
//! * [`NullRecorder`] - Discards everything
//!
//! # Basic Usage
//!
//! ```rust
//! use flapq_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(12.0));
//! record.insert("score", RecordValue::Scalar(3.0));
//! record.insert("n_ticks", RecordValue::Scalar(250.0));
//! assert_eq!(record.get_scalar("score").unwrap(), 3.0);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
