//! # Intake Core
//!
//! Unified input-sanitization facade for chat surfaces that forward
//! untrusted text to a language model. Orchestrates the pure stages,
//! the rate limiter and the sink-hardening shield behind one call.
//!
//! ## Threat Coverage
//!
//! | Layer | Component | Threats Handled |
//! |-------|-----------|-----------------|
//! | Admission | Rate limiter | Floods, probe storms, cost amplification |
//! | Canonical | Pattern normalizer | Encoding evasion, invisible characters |
//! | Detection | Input validator | Traversal, command/script/SQL injection, homoglyphs |
//! | Protocol | Text escaper | Role/turn delimiter smuggling |
//! | Content | Profanity filter | Abusive language |
//! | Sink | Enhanced sanitizer | XSS, SQL, DoS payloads per rendering sink |
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        INTAKE CORE                            │
//! ├───────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │                   ┌─────────────────┐                         │
//! │                   │  InputPipeline  │  ← Unified Facade       │
//! │                   └────────┬────────┘                         │
//! │                            │                                  │
//! │     ┌──────────┬───────────┼───────────┬────────────┐         │
//! │     ▼          ▼           ▼           ▼            ▼         │
//! │ ┌────────┐ ┌────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐   │
//! │ │  Rate  │ │ Stages │ │ Escaper │ │ Profan. │ │  Shield  │   │
//! │ │ Limiter│ │ (norm+ │ │ (model  │ │ Filter  │ │ (per-sink│   │
//! │ │        │ │  valid)│ │  proto) │ │         │ │  harden) │   │
//! │ └────────┘ └────────┘ └─────────┘ └─────────┘ └──────────┘   │
//! │                                                               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use intake_core::{InputPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default().with_model_type("claude-3");
//! let mut pipeline = InputPipeline::new(config).unwrap();
//!
//! match pipeline.run("How do I use this?") {
//!     Ok((sanitized, intent)) => {
//!         // forward (sanitized, intent) to the agent
//!         assert!(!sanitized.is_empty());
//!     }
//!     Err(err) => {
//!         // "rate_limited" or "blocked"
//!         let _code = err.reason_code();
//!     }
//! }
//! ```
//!
//! ## Security Notes
//!
//! - Stage order is fixed; normalization always precedes validation
//! - Only the limiter and CRITICAL validation can halt a run; every
//!   other stage fails open with maximal mitigation applied
//! - The limiter is invoked exactly once per `run` call
//! - All decisions are deterministic and auditable; there is no model
//!   or heuristic state involved

mod config;
mod context;
mod error;
mod pipeline;

pub use config::{PipelineConfig, ProfanityConfig};
pub use context::ConversationContext;
pub use error::PipelineError;
pub use pipeline::{FeedbackHook, InputPipeline};

// Re-export component types for convenience
pub use intake_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter, RateLimitStrategy};
pub use intake_shield::{
    EnhancedInputSanitizer, SanitizeContext, SanitizeOptions, SecurityMonitor, SecuritySummary,
};
pub use intake_stages::{
    EscapeStrategy, Intent, IntentType, Severity, TextEscaper, ThreatLevel, ValidationError,
};

/// Core result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests;
