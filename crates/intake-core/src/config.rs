//! Configuration types for the input pipeline.

use serde::{Deserialize, Serialize};

use intake_limiter::RateLimitConfig;
use intake_shield::SanitizeContext;

/// Configuration for the [`InputPipeline`](crate::InputPipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model identifier selecting the escaping strategy
    /// (e.g. "claude-3-opus", "gpt-4", anything else for default).
    pub model_type: String,

    /// Run the enhanced sink-hardening layer after the base stages.
    pub enable_enhanced_security: bool,

    /// Sink the enhanced layer hardens for.
    pub sanitize_context: SanitizeContext,

    /// Per-caller admission control.
    pub rate_limit: RateLimitConfig,

    /// Profanity filtering.
    pub profanity: ProfanityConfig,

    /// Hard ceiling on raw input length, in bytes.
    pub max_input_length: usize,

    /// Keep non-ASCII text. Invisible characters spliced into
    /// identifiers are stripped regardless.
    pub allow_unicode: bool,

    /// Apply strict-mode restrictions in the enhanced layer.
    pub strict_mode: bool,

    /// Caller identity used as the rate-limit key.
    pub session_key: String,
}

impl PipelineConfig {
    /// Sets the model identifier.
    #[must_use]
    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = model_type.into();
        self
    }

    /// Sets the rate-limit configuration.
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Sets the sanitize context.
    #[must_use]
    pub fn with_sanitize_context(mut self, context: SanitizeContext) -> Self {
        self.sanitize_context = context;
        self
    }

    /// Enables or disables the enhanced layer.
    #[must_use]
    pub fn with_enhanced_security(mut self, enabled: bool) -> Self {
        self.enable_enhanced_security = enabled;
        self
    }

    /// Sets the caller identity.
    #[must_use]
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    /// Sets unicode tolerance.
    #[must_use]
    pub fn with_allow_unicode(mut self, allow: bool) -> Self {
        self.allow_unicode = allow;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_type: "default".to_string(),
            enable_enhanced_security: true,
            sanitize_context: SanitizeContext::General,
            rate_limit: RateLimitConfig::default(),
            profanity: ProfanityConfig::default(),
            max_input_length: 10_000,
            allow_unicode: true,
            strict_mode: false,
            session_key: "local".to_string(),
        }
    }
}

/// Profanity filtering configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfanityConfig {
    /// Run the filter at all.
    pub enabled: bool,

    /// Treat a Severe match as a hard block instead of masking it.
    pub blocks_severe: bool,
}

impl Default for ProfanityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocks_severe: false,
        }
    }
}
