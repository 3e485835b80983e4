//! Hard failures.
//!
//! Range problems with otherwise usable inputs are not errors: they raise the
//! [`Warning`](crate::Warning) attached to results instead.

use thiserror::Error;

/// Inputs the model refuses to compute with.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ItmError {
    #[error("elevation profile has {len} samples, more than the supported {max}")]
    ProfileTooLong { len: usize, max: usize },

    #[error("elevation profile needs at least 2 samples a positive distance apart (got {len} samples, {interval} m apart)")]
    DegenerateProfile { len: usize, interval: f64 },

    #[error("antenna height may not be negative (got {0} m)")]
    NegativeHeight(f64),

    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    #[error("distance may not be negative (got {0} m)")]
    NegativeDistance(f64),

    #[error("frequency must be positive (got {0} MHz)")]
    NonPositiveFrequency(f64),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ItmError>;
