// src/error.rs
use thiserror::Error;

/// Error types for the bsm-sweep library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// A required construction input was not supplied
    #[error("Missing input '{field}': {reason}")]
    MissingInput { field: String, reason: String },

    /// Two mutually exclusive inputs were both supplied
    #[error("Conflicting inputs: '{first}' and '{second}' cannot both be supplied")]
    ConflictingInputs { first: String, second: String },

    /// Iterative solver did not reach its tolerance
    #[error("{method} failed to converge after {iterations} iterations: {reason}")]
    ConvergenceFailure {
        method: String,
        iterations: usize,
        reason: String,
    },

    /// Sweep specification is malformed
    #[error("Invalid sweep specification: {reason}")]
    InvalidSweep { reason: String },

    /// Requested output name is not one of the known outputs
    #[error("Unknown output '{name}'")]
    UnknownOutput { name: String },

    /// Pricing parameter name is not one of S0, K, vol, r, T, q
    #[error("Unknown pricing parameter '{name}'")]
    UnknownParameter { name: String },

    /// Array inputs cannot be broadcast against each other
    #[error("Shapes {left:?} and {right:?} cannot be broadcast together")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// Unsupported operation
    #[error("Unsupported operation '{operation}' in context: {context}")]
    UnsupportedOperation { operation: String, context: String },
}

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing, contradictory or out-of-domain inputs
    Input,
    /// Implied-volatility inversion failed
    Convergence,
    /// Malformed sweep request
    SweepSpec,
}

impl PricingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PricingError::InvalidParameters { .. }
            | PricingError::MissingInput { .. }
            | PricingError::ConflictingInputs { .. }
            | PricingError::UnknownParameter { .. }
            | PricingError::ShapeMismatch { .. }
            | PricingError::UnsupportedOperation { .. } => ErrorCategory::Input,
            PricingError::ConvergenceFailure { .. } => ErrorCategory::Convergence,
            PricingError::InvalidSweep { .. } | PricingError::UnknownOutput { .. } => {
                ErrorCategory::SweepSpec
            }
        }
    }

    pub(crate) fn missing(field: &str, reason: &str) -> Self {
        PricingError::MissingInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_sweep(reason: impl Into<String>) -> Self {
        PricingError::InvalidSweep {
            reason: reason.into(),
        }
    }
}

/// Result type alias for bsm-sweep operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Validation utilities
pub mod validation {
    use super::{PricingError, PricingResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> PricingResult<()> {
        validate_finite(name, value)?;
        if value <= 0.0 {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> PricingResult<()> {
        validate_finite(name, value)?;
        if value < 0.0 {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> PricingResult<()> {
        if !value.is_finite() {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a sweep step count
    pub fn validate_steps(name: &str, steps: usize) -> PricingResult<()> {
        if steps == 0 {
            Err(PricingError::invalid_sweep(format!(
                "'{}' needs at least one step",
                name
            )))
        } else if steps > 100_000 {
            Err(PricingError::invalid_sweep(format!(
                "'{}' exceeds maximum allowed steps (100,000)",
                name
            )))
        } else {
            Ok(())
        }
    }
}
