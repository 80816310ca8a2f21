//! Error types for wellbeing-viz operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wellbeing-viz operations.
///
/// Empty filter results and missing-value sentinels are not errors; they flow
/// through the pipeline as empty collections and `-999` values respectively.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (configuration files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An attribute key that is not one of the record's numeric fields.
    #[error("unknown attribute key '{0}'")]
    UnknownAttribute(String),

    /// A region that does not occur in the loaded dataset.
    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    /// A numeric range with a non-finite bound.
    #[error("invalid range for '{key}': [{min}, {max}]")]
    InvalidRange {
        /// Attribute key the range was meant for.
        key: String,
        /// Lower bound as supplied.
        min: f64,
        /// Upper bound as supplied.
        max: f64,
    },

    /// A dataset with no records was supplied where defaults must be derived.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A topic was published from inside its own handler chain.
    #[error("re-entrant publish on topic '{topic}'")]
    ReentrantPublish {
        /// Topic name.
        topic: &'static str,
    },

    /// Nested publishes exceeded the configured depth.
    #[error("dispatch depth {depth} exceeded while publishing '{topic}'")]
    DispatchDepthExceeded {
        /// Topic name.
        topic: &'static str,
        /// Configured maximum depth.
        depth: usize,
    },

    /// Gestures kept re-queueing each other within one turn.
    #[error("gesture storm: more than {limit} gestures in one turn")]
    GestureStorm {
        /// Configured per-turn limit.
        limit: usize,
    },

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },
}
