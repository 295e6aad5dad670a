//! Error types for the input pipeline.

use std::time::Duration;

use thiserror::Error;

use intake_stages::ValidationError;

/// Pipeline-level failure. Only two things can halt a run: the rate
/// limiter's admission decision and a CRITICAL validation error. Every
/// other finding is folded into the output as mitigation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller exceeded their admission allowance.
    #[error("rate limit exceeded, retry in {}ms", retry_after.as_millis())]
    RateLimited {
        /// Time until the caller's window frees a slot.
        retry_after: Duration,
    },

    /// The request was vetoed by a configured policy (e.g. severe
    /// profanity with blocking enabled).
    #[error("request blocked: {}", reasons.join("; "))]
    Blocked {
        /// Human-readable reasons, in detection order.
        reasons: Vec<String>,
    },

    /// CRITICAL structural violation from the validator.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Machine-readable reason code, stable across error message
    /// changes. Callers branch on this, never on the display text.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Blocked { .. } | Self::Validation(_) => "blocked",
            Self::Config(_) => "config",
        }
    }
}
