//! # Intake Stages - Pure Sanitization Pipeline Stages
//!
//! The stateless stages of the Intake Guard input pipeline. Everything
//! in this crate is a pure function of its input plus a static rule
//! table: no I/O, no shared state, safe to call concurrently from any
//! number of threads.
//!
//! ## Stage Order
//!
//! The pipeline facade composes these in a fixed order; the contract
//! each stage relies on is that the previous one already ran:
//!
//! ```text
//! raw text
//!    │
//!    ▼
//! ┌──────────────────┐  canonical Unicode, decoded separators,
//! │ PatternNormalizer│  invisible characters stripped
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐  signature battery over the CANONICAL text,
//! │  InputValidator  │  max threat level + reasons
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐  model-protocol delimiters neutralized
//! │   TextEscaper    │
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐  lexicon hits masked, severity telemetry
//! │ ProfanityFilter  │
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐  category + confidence over cleaned text
//! │ IntentClassifier │
//! └──────────────────┘
//! ```
//!
//! Normalization before validation is the one ordering that is security
//! critical: attacks must not be detectable only in their encoded form.
//!
//! ## Usage
//!
//! ```rust
//! use intake_stages::{InputValidator, PatternNormalizer, ThreatLevel};
//!
//! let normalizer = PatternNormalizer::new(true);
//! let validator = InputValidator::new();
//!
//! let normalized = normalizer.normalize("%2e%2e%2fetc%2fpasswd");
//! let result = validator.validate_normalized(&normalized).unwrap();
//! assert!(result.threat_level >= ThreatLevel::High);
//! ```

pub mod escaping;
pub mod intent;
pub mod pattern;
pub mod profanity;
pub mod validation;

pub use escaping::{escape_for_model, EscapeStrategy, TextEscaper};
pub use intent::{classify_intent, Intent, IntentClassifier, IntentType};
pub use pattern::{
    fold_confusables, normalize_input, FuzzyMatcher, Normalized, PatternNormalizer,
};
pub use profanity::{
    filter_profanity, FilterResult, ProfanityFilter, ProfanityMatch, Severity,
};
pub use validation::{InputValidator, ThreatLevel, ValidationError, ValidationResult};
