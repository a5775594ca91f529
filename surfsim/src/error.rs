//! Error types for the surface simulator.

use thiserror::Error;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by the simulator.
///
/// Dimension, index and parameter errors are caller contract violations and
/// are returned immediately. A malformed document never touches live state.
/// `NoHistory` is benign: undo/redo at a boundary simply does nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Grid with zero rows or columns.
    #[error("invalid grid dimension {rows}x{cols}")]
    InvalidDimension { rows: usize, cols: usize },

    /// Well edit on an index the registry does not hold.
    #[error("well index {index} out of range (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Persisted state with missing fields, bad values or wrong buffer length.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Undo/redo past either end of the history log.
    #[error("no history in that direction")]
    NoHistory,

    /// Non-finite or out-of-domain numeric parameter.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Reading or writing a state document failed.
    #[error("io error: {0}")]
    Io(String),
}

impl SimError {
    /// Create a malformed document error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

/// Reject anything that is not a finite, strictly positive number.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

/// Reject NaN and infinities.
pub(crate) fn require_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}
