// SynthTS - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for SynthTS
//!
//! Every generator validates its arguments up front, so an error means no
//! output was produced and no state was changed.

use crate::stages::Stage;
use thiserror::Error;

/// Result type alias for SynthTS operations
pub type Result<T> = std::result::Result<T, SynthError>;

/// Main error type for generation operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    /// Argument outside its valid range
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A stage was run before the stage it derives from
    #[error("Cannot run {stage}: {requires} has not run yet")]
    PrecedenceViolation { stage: Stage, requires: Stage },

    /// Timestamp not in `YYYY-MM-DD HH:MM:SS` form
    #[error("Invalid timestamp '{value}': {source}")]
    TimeParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl SynthError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SynthError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Check that `value` lies strictly inside `(0, 1)`.
pub(crate) fn ensure_open_unit(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SynthError::invalid(
            name,
            format!("must be between 0.0 and 1.0 (exclusive), got {}", value),
        ))
    }
}

/// Check that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SynthError::invalid(
            name,
            format!("must be greater than 0.0, got {}", value),
        ))
    }
}

/// Check that `value` is finite and not negative (standard deviations).
pub(crate) fn ensure_std_dev(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SynthError::invalid(
            name,
            format!("must be a finite, non-negative standard deviation, got {}", value),
        ))
    }
}
