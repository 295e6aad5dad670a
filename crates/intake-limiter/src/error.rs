//! Error types for the rate limiter.

use thiserror::Error;

/// Result type alias for limiter operations.
pub type Result<T> = std::result::Result<T, LimiterError>;

/// Errors that can occur when constructing a limiter.
///
/// Admission checks themselves never fail; denial is a status, not an
/// error.
#[derive(Debug, Error, PartialEq)]
pub enum LimiterError {
    /// The configured limit is zero; every request would be denied.
    #[error("rate limit must be at least 1, got {0}")]
    ZeroLimit(u32),

    /// The configured window is not a positive finite duration.
    #[error("window must be positive and finite, got {0}")]
    InvalidWindow(f64),
}
