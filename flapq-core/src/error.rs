//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum FlapqError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// An observation does not carry the two obstacle pairs needed for discretization.
    #[error("Observation has {0} obstacle pair(s), at least 2 are required")]
    InsufficientObstacles(usize),

    /// A bucketed observation offset does not fit in a state component.
    #[error("Bucketed offset {0} is out of range")]
    ObservationOutOfRange(i64),

    /// A persisted Q-table could not be interpreted.
    #[error("Malformed Q-table: {0}")]
    MalformedTable(String),

    /// A persisted training session could not be interpreted.
    #[error("Malformed training session: {0}")]
    MalformedSession(String),

    /// A state cannot be addressed in a dense table.
    #[error("State {0} is outside of the dense table layout")]
    StateOutOfBounds(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
