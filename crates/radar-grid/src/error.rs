//! Error types for polar resampling.

use thiserror::Error;

/// Errors that can occur while building or resampling a polar field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The field has no rays or no gates.
    #[error("polar field has no rays or no gates")]
    EmptyField,

    /// Sample count does not equal rays x gates.
    #[error("polar field holds {actual} samples, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Requested output side length is unusable.
    #[error("invalid grid size {0}")]
    InvalidSize(usize),

    /// Configuration rejected by validation.
    #[error("invalid resample configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for resampling operations.
pub type Result<T> = std::result::Result<T, GridError>;
