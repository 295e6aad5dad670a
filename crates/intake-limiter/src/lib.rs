//! # Intake Limiter - Request Admission Control
//!
//! Stateful, per-caller rate limiting for the Intake Guard pipeline.
//! Admission control is independent of content: whether a request
//! proceeds at all is decided here, before any content stage spends
//! cycles on a request that will not be served.
//!
//! ## Threat Model
//!
//! Without admission control a single caller can:
//! - **Flood the pipeline** with sanitization work (CPU exhaustion)
//! - **Amplify downstream cost** by driving model calls at line rate
//! - **Probe detection rules** with rapid-fire mutated payloads
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                RateLimiter                  │
//! │  ┌───────────────────────────────────────┐  │
//! │  │  key table (one window state per key) │  │
//! │  │   "alice" → FixedWindow(start, n)     │  │
//! │  │   "bob"   → TokenBucket(tokens, t)    │  │
//! │  └───────────────────────────────────────┘  │
//! │        one lock, one read-modify-write      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Security Notes
//!
//! - Check-and-increment is a single critical section per call; a
//!   concurrent caller can never slip between the read and the write
//! - Configuration is immutable after construction; changing limits
//!   means building a new limiter
//! - Reset is privileged (operator/test surface only)

mod error;
mod limiter;
mod strategy;

pub use error::{LimiterError, Result};
pub use limiter::{RateLimitStatus, RateLimiter};
pub use strategy::{RateLimitConfig, RateLimitStrategy};
