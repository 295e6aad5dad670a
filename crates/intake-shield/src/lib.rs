//! # Intake Shield - Sink-Specific Hardening
//!
//! Defense-in-depth layer of the Intake Guard pipeline. The base stages
//! detect and score attacks generically; this crate guarantees that the
//! final string is safe for the specific sink that will consume it, and
//! keeps the attack ledger for observability.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`EnhancedInputSanitizer`] | Context-aware neutralization (html/sql/plain/general) |
//! | [`SecurityMonitor`] | Append-only attack counters, audit snapshot |
//!
//! ## Security Notes
//!
//! - "Safe for SQL" and "safe for HTML" are different properties; one
//!   escaping pass cannot satisfy both, hence the per-sink transforms
//! - The sanitizer is fail-open: it always returns a mitigated string,
//!   never an error
//! - Counters are monotone and read-concurrently safe; the summary is
//!   for audit, never for control flow

mod monitor;
mod sanitizer;

pub use monitor::{SecurityMonitor, SecuritySummary};
pub use sanitizer::{
    categories, EnhancedInputSanitizer, SanitizeContext, SanitizeOptions,
};
