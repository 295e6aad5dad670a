//! The unified input pipeline facade.
//!
//! This module provides the main entry point for the Intake Guard
//! sanitization system. The [`InputPipeline`] struct owns the stage
//! order, aggregates the threat assessment, applies the block/allow
//! decision and exposes the single `run(text) -> (sanitized, intent)`
//! contract to callers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use intake_limiter::{RateLimiter, RateLimitStatus};
use intake_shield::{EnhancedInputSanitizer, SanitizeOptions, SecurityMonitor, SecuritySummary};
use intake_stages::{
    Intent, IntentClassifier, InputValidator, PatternNormalizer, ProfanityFilter, Severity,
    TextEscaper, ThreatLevel, ValidationResult,
};

use crate::{config::PipelineConfig, error::PipelineError, context::ConversationContext};

/// Callback surfacing human-readable warnings to the calling UI.
/// Fire-and-forget; no return value is consumed.
pub type FeedbackHook = Box<dyn Fn(&str) + Send + Sync>;

/// The unified input sanitization pipeline.
///
/// Every input passes through every stage in a fixed order; control
/// never branches per attack type. Each stage can escalate the
/// aggregate threat level, but only two things halt a run: the rate
/// limiter's admission decision and a CRITICAL validation error.
///
/// # Stage Order
///
/// 1. Rate-limit gate (no content work for a request that will not be
///    served)
/// 2. Pattern normalization (canonical form before any matching)
/// 3. Validation (signature battery, threat scoring, CRITICAL stop)
/// 4. Enhanced sink hardening (when enabled; must see the text before
///    escaping rewrites the characters its detectors key on)
/// 5. Model-specific escaping
/// 6. Profanity filtering
/// 7. Intent classification (over cleaned text only)
///
/// # Example
///
/// ```rust
/// use intake_core::{InputPipeline, PipelineConfig};
///
/// let mut pipeline = InputPipeline::new(PipelineConfig::default()).unwrap();
/// let (sanitized, intent) = pipeline.run("Set a timer for 10 minutes").unwrap();
/// assert!(!sanitized.is_empty());
/// ```
pub struct InputPipeline {
    /// Configuration.
    config: PipelineConfig,

    /// Stage: canonicalization.
    normalizer: PatternNormalizer,

    /// Stage: signature battery.
    validator: InputValidator,

    /// Stage: model-protocol escaping.
    escaper: TextEscaper,

    /// Stage: lexicon filtering.
    profanity: ProfanityFilter,

    /// Stage: intent classification.
    classifier: IntentClassifier,

    /// Admission control, shared process-wide.
    limiter: Arc<RateLimiter>,

    /// Sink hardening layer.
    shield: EnhancedInputSanitizer,

    /// Attack accounting, shared with the shield.
    monitor: Arc<SecurityMonitor>,

    /// Recent sanitized turns, hint for the classifier.
    context: ConversationContext,

    /// UI feedback hook.
    feedback: Option<FeedbackHook>,

    /// Maximum threat level observed in the most recent run.
    last_threat: ThreatLevel,
}

impl InputPipeline {
    /// Creates a pipeline owning fresh limiter and monitor state.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the rate-limit
    /// configuration could never admit a request.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let limiter = RateLimiter::new(config.rate_limit)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let monitor = Arc::new(SecurityMonitor::new());
        Ok(Self::assemble(config, Arc::new(limiter), monitor))
    }

    /// Creates a pipeline over externally owned limiter and monitor.
    ///
    /// The deployment pattern is one limiter and one monitor per
    /// process, injected at the application's composition root; several
    /// pipelines (one per session) then share the same admission table
    /// and attack ledger.
    #[must_use]
    pub fn with_shared_state(
        config: PipelineConfig,
        limiter: Arc<RateLimiter>,
        monitor: Arc<SecurityMonitor>,
    ) -> Self {
        Self::assemble(config, limiter, monitor)
    }

    fn assemble(
        config: PipelineConfig,
        limiter: Arc<RateLimiter>,
        monitor: Arc<SecurityMonitor>,
    ) -> Self {
        let shield = EnhancedInputSanitizer::with_monitor(Arc::clone(&monitor));
        info!(
            model = %config.model_type,
            enhanced = config.enable_enhanced_security,
            "input pipeline initialized"
        );
        Self {
            normalizer: PatternNormalizer::new(config.allow_unicode),
            validator: InputValidator::with_max_length(config.max_input_length),
            escaper: TextEscaper::for_model(&config.model_type),
            profanity: ProfanityFilter::new(),
            classifier: IntentClassifier::new(),
            limiter,
            shield,
            monitor,
            context: ConversationContext::default(),
            feedback: None,
            last_threat: ThreatLevel::None,
            config,
        }
    }

    /// Attaches a UI feedback hook.
    #[must_use]
    pub fn with_feedback(mut self, hook: FeedbackHook) -> Self {
        self.feedback = Some(hook);
        self
    }

    /// Runs the full pipeline on one raw input.
    ///
    /// # Returns
    ///
    /// The sanitized text plus the classified intent, for the calling
    /// agent to act on.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::RateLimited`] when the caller's admission
    ///   allowance is exhausted
    /// - [`PipelineError::Validation`] on a CRITICAL structural
    ///   violation
    /// - [`PipelineError::Blocked`] when a configured policy vetoes the
    ///   request (severe profanity with blocking enabled)
    pub fn run(&mut self, raw_text: &str) -> Result<(String, Intent), PipelineError> {
        self.last_threat = ThreatLevel::None;

        // Phase 1: admission. Exactly one check per run, before any
        // content work.
        self.check_admission()?;

        // Phase 2: canonicalization.
        let normalized = self.normalizer.normalize(raw_text);

        // Phase 3: validation. The only content stage allowed to halt.
        let validation = self.check_validation(&normalized)?;
        self.last_threat = validation.threat_level;

        // Mitigation baseline: with the shield enabled it owns the
        // stripping (and the attack accounting); without it, fall back
        // to the validator's hint for anything scored High.
        let mut text = if !self.config.enable_enhanced_security
            && validation.threat_level >= ThreatLevel::High
        {
            validation.sanitized_hint.unwrap_or(normalized.text)
        } else {
            normalized.text
        };

        // Phase 4: sink hardening. Runs before escaping so its
        // detectors see the raw metacharacters, not their entities.
        if self.config.enable_enhanced_security {
            let opts = SanitizeOptions::for_context(self.config.sanitize_context)
                .with_strict_mode(self.config.strict_mode)
                .with_allow_unicode(self.config.allow_unicode)
                .with_max_length(self.config.max_input_length);
            text = self.shield.sanitize_input(&text, &opts);
        }

        // Phase 5: model-protocol escaping.
        text = self.escaper.escape(&text);

        // Phase 6: profanity filtering.
        text = self.check_profanity(&text)?;

        // Phase 7: intent, over cleaned text only.
        let intent = self
            .classifier
            .classify_with_context(&text, &self.context.snapshot());

        self.context.push(&text);
        debug!(
            intent = %intent.intent_type,
            threat = %self.last_threat,
            "pipeline run complete"
        );
        Ok((text, intent))
    }

    /// Phase 1: the rate-limit gate.
    fn check_admission(&self) -> Result<RateLimitStatus, PipelineError> {
        let status = self.limiter.check(&self.config.session_key);
        if status.allowed {
            return Ok(status);
        }
        let retry_after = self.limiter.retry_after(&self.config.session_key);
        warn!(
            key = %self.config.session_key,
            retry_after_ms = retry_after.as_millis() as u64,
            "request rate limited"
        );
        self.notify(&format!(
            "Too many requests. Try again in {:.1}s.",
            retry_after.as_secs_f64()
        ));
        Err(PipelineError::RateLimited { retry_after })
    }

    /// Phase 3: validation with feedback on findings.
    fn check_validation(
        &self,
        normalized: &intake_stages::Normalized,
    ) -> Result<ValidationResult, PipelineError> {
        match self.validator.validate_normalized(normalized) {
            Ok(result) => {
                if !result.is_valid {
                    warn!(
                        threat = %result.threat_level,
                        reasons = ?result.reasons,
                        "suspicious input mitigated"
                    );
                    self.notify(&format!(
                        "Suspicious content was removed: {}",
                        result.reasons.join(", ")
                    ));
                }
                Ok(result)
            }
            Err(err) => {
                warn!(error = %err, "input rejected by validator");
                self.notify("Request blocked: the input failed safety validation.");
                Err(err.into())
            }
        }
    }

    /// Phase 6: profanity filtering with the optional severity veto.
    fn check_profanity(&self, text: &str) -> Result<String, PipelineError> {
        if !self.config.profanity.enabled {
            return Ok(text.to_string());
        }
        let result = self.profanity.filter(text);
        if result.matches.is_empty() {
            return Ok(result.filtered_text);
        }

        self.notify("Some language was filtered from your message.");
        if self.config.profanity.blocks_severe
            && result.max_severity() == Some(Severity::Severe)
        {
            let reasons: Vec<String> = result
                .matches
                .iter()
                .filter(|m| m.severity == Severity::Severe)
                .map(|m| format!("severe term '{}'", m.term))
                .collect();
            warn!(?reasons, "request blocked by profanity policy");
            return Err(PipelineError::Blocked { reasons });
        }
        Ok(result.filtered_text)
    }

    /// Invokes the feedback hook, if attached.
    fn notify(&self, message: &str) {
        if let Some(hook) = &self.feedback {
            hook(message);
        }
    }

    /// Maximum threat level observed during the most recent run.
    #[must_use]
    pub const fn last_threat(&self) -> ThreatLevel {
        self.last_threat
    }

    /// Swaps the escaping strategy at runtime.
    pub fn update_model_type(&mut self, model_type: impl Into<String>) {
        let model_type = model_type.into();
        self.escaper = TextEscaper::for_model(&model_type);
        info!(model = %model_type, "escaping strategy updated");
        self.config.model_type = model_type;
    }

    /// Clears one caller's admission state, or all of it.
    ///
    /// Operator/test surface, not part of the request hot path.
    pub fn reset_rate_limit(&self, key: Option<&str>) {
        self.limiter.reset(key);
    }

    /// Read-only snapshot of the attack counters.
    #[must_use]
    pub fn security_summary(&self) -> SecuritySummary {
        self.monitor.summary()
    }

    /// Recent sanitized turns, oldest first.
    #[must_use]
    pub fn conversation_context(&self) -> String {
        self.context.snapshot()
    }

    /// Forgets the recent turns.
    pub fn clear_context(&mut self) {
        self.context.clear();
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
