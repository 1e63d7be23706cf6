//! Error types for the fieldlines core.
//!
//! Only configuration and I/O problems are errors. Per-tick anomalies
//! (a point landing exactly on a source, a collision, a boundary escape)
//! are lifecycle events handled inside the simulation and never surface here.

use thiserror::Error;

/// Errors produced while building or persisting a simulation.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Field width or height was zero, negative, or not finite.
    #[error("invalid dimensions: width and height must be positive and finite, got {width} x {height}")]
    InvalidDimensions { width: f64, height: f64 },

    /// History capacity of zero: a trail must hold at least the current position.
    #[error("invalid history capacity: trails must hold at least one position")]
    InvalidHistory,

    /// A parameter had the right type but an unusable value.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    /// A parameter existed but had the wrong JSON type.
    #[error("parameter type mismatch for '{name}': expected {expected}, got {got}")]
    ParamTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// An explicitly listed source was rejected.
    #[error("invalid source #{index}: {reason}")]
    InvalidSource { index: usize, reason: String },

    /// The `source_layout` parameter named no known layout.
    #[error("unknown source layout: {0}")]
    UnknownLayout(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Writing a snapshot or reading a run description failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl FieldError {
    /// Shorthand for [`FieldError::InvalidParam`].
    pub fn invalid_param(name: &str, reason: impl Into<String>) -> Self {
        FieldError::InvalidParam {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
