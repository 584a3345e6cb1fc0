//! Error types for the chronostat aggregation framework.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for chronostat operations.
pub type Result<T> = std::result::Result<T, ChronostatError>;

/// Errors that can occur while building, merging, or persisting aggregates.
///
/// Everything except [`ChronostatError::MissingData`] signals either a caller
/// bug or corrupted data and should not be retried. `MissingData` is
/// recoverable at the [`crate::report_set::ReportSet`] level, where the
/// affected window is routed into the missing-times bookkeeping instead.
#[derive(Error, Debug)]
pub enum ChronostatError {
    /// Two values with different schema versions were compared or unioned.
    #[error("version mismatch: {ours} vs {theirs}")]
    VersionMismatch {
        /// Version carried by the receiver.
        ours: String,
        /// Version carried by the other operand.
        theirs: String,
    },

    /// Union attempted between values with mismatched type or configuration.
    #[error("incompatible union: {0}")]
    IncompatibleUnion(String),

    /// Merge attempted between reports covering the same time twice.
    #[error("overlapping coverage: {0}")]
    OverlappingCoverage(String),

    /// An internal invariant failed; indicates data corruption.
    #[error("inconsistent value: {0}")]
    Inconsistent(String),

    /// Complement requested with respect to a set that is not a superset.
    #[error("not a superset: {0}")]
    NotASuperset(String),

    /// An interval set was expected to lie on frame boundaries but does not.
    #[error("not frame aligned: {0}")]
    NotFrameAligned(String),

    /// Expected upstream data is absent for the requested window.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Endpoint list rejected by the interval-set constructor.
    #[error("invalid interval data: {0}")]
    InvalidIntervalData(String),

    /// Boundary query issued against an empty interval set.
    #[error("cannot query bounds of an empty interval set")]
    EmptySet,

    /// Deserialization dispatch found no registered decoder for a type tag.
    #[error("unknown type tag: {0}")]
    UnknownTypeTag(String),

    /// Sample block shape or content rejected by an aggregate constructor.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Dictionary encode/decode error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persistence refused because the destination already exists.
    #[error("destination already exists, will not overwrite: {0}")]
    DestinationExists(PathBuf),

    /// Timestamp text could not be converted.
    #[error("time conversion failed: {0}")]
    TimeConversion(String),

    /// Underlying I/O error from a collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChronostatError {
    /// Creates an incompatible-union error with the given message.
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::IncompatibleUnion(msg.into())
    }

    /// Creates an overlapping-coverage error with the given message.
    pub fn overlapping(msg: impl Into<String>) -> Self {
        Self::OverlappingCoverage(msg.into())
    }

    /// Creates an inconsistency error with the given message.
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }

    /// Creates an invalid-interval-data error with the given message.
    pub fn invalid_intervals(msg: impl Into<String>) -> Self {
        Self::InvalidIntervalData(msg.into())
    }

    /// Creates an invalid-data error with the given message.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Creates a missing-data error with the given message.
    pub fn missing_data(msg: impl Into<String>) -> Self {
        Self::MissingData(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a version-mismatch error from the two offending versions.
    pub fn version_mismatch(ours: impl Into<String>, theirs: impl Into<String>) -> Self {
        Self::VersionMismatch {
            ours: ours.into(),
            theirs: theirs.into(),
        }
    }
}

/// Converts serde_json errors to ChronostatError.
impl From<serde_json::Error> for ChronostatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Converts chrono parse errors to ChronostatError.
impl From<chrono::ParseError> for ChronostatError {
    fn from(err: chrono::ParseError) -> Self {
        Self::TimeConversion(err.to_string())
    }
}
