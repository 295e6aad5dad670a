//! Facade-level unit tests.

use std::sync::{Arc, Mutex};

use crate::{
    InputPipeline, IntentType, PipelineConfig, PipelineError, RateLimitConfig, SanitizeContext,
    ThreatLevel,
};

fn test_config() -> PipelineConfig {
    // Generous limit so content tests never trip the gate.
    PipelineConfig::default().with_rate_limit(RateLimitConfig::new(1000, 60.0))
}

#[test]
fn test_pipeline_creation() {
    assert!(InputPipeline::new(test_config()).is_ok());
}

#[test]
fn test_invalid_rate_limit_rejected_at_construction() {
    let config = test_config().with_rate_limit(RateLimitConfig::new(0, 60.0));
    let err = InputPipeline::new(config).err().unwrap();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_clean_input_round_trip() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    let (text, intent) = pipeline.run("Set a timer for 10 minutes").unwrap();
    assert!(text.contains("timer"));
    assert_eq!(intent.intent_type, IntentType::Timer);
    assert_eq!(pipeline.last_threat(), ThreatLevel::None);
}

#[test]
fn test_empty_input_is_general_with_no_findings() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    let (text, intent) = pipeline.run("").unwrap();
    assert_eq!(text, "");
    assert_eq!(intent.intent_type, IntentType::General);
    assert_eq!(pipeline.security_summary().total_attacks, 0);
}

#[test]
fn test_traversal_neutralized_and_scored() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    let (text, _) = pipeline.run("../../../etc/passwd").unwrap();
    assert!(!text.contains("../"));
    assert!(pipeline.last_threat() >= ThreatLevel::High);
}

#[test]
fn test_null_byte_rejected() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    let err = pipeline.run("probe\0../etc/passwd").unwrap_err();
    assert_eq!(err.reason_code(), "blocked");
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn test_oversized_input_rejected() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    let huge = "a".repeat(20_000);
    let err = pipeline.run(&huge).unwrap_err();
    assert_eq!(err.reason_code(), "blocked");
}

#[test]
fn test_rate_limit_gate() {
    let config = test_config()
        .with_rate_limit(RateLimitConfig::new(3, 3600.0))
        .with_session_key("gated");
    let mut pipeline = InputPipeline::new(config).unwrap();

    for _ in 0..3 {
        assert!(pipeline.run("hello").is_ok());
    }
    let err = pipeline.run("hello").unwrap_err();
    assert_eq!(err.reason_code(), "rate_limited");

    pipeline.reset_rate_limit(Some("gated"));
    assert!(pipeline.run("hello").is_ok());
}

#[test]
fn test_profanity_masked_by_default() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    let (text, _) = pipeline.run("this contains badword content").unwrap();
    assert!(!text.contains("badword"));
    assert!(text.contains("****"));
}

#[test]
fn test_profanity_severe_veto_when_configured() {
    let mut config = test_config();
    config.profanity.blocks_severe = true;
    let mut pipeline = InputPipeline::new(config).unwrap();

    // Moderate terms still pass, masked
    assert!(pipeline.run("badword").is_ok());

    let err = pipeline.run("fuck this").unwrap_err();
    assert_eq!(err.reason_code(), "blocked");
}

#[test]
fn test_feedback_hook_invoked_on_findings() {
    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);

    let mut pipeline = InputPipeline::new(test_config())
        .unwrap()
        .with_feedback(Box::new(move |msg| {
            sink.lock().unwrap().push(msg.to_string());
        }));

    pipeline.run("a clean sentence").unwrap();
    assert!(messages.lock().unwrap().is_empty());

    pipeline.run("../../../etc/passwd").unwrap();
    assert!(!messages.lock().unwrap().is_empty());
}

#[test]
fn test_update_model_type_swaps_escaping() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();

    pipeline.update_model_type("gpt-4");
    let (text, _) = pipeline.run("run ```ls``` please").unwrap();
    assert!(!text.contains("```"));
}

#[test]
fn test_conversation_context_accumulates() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    pipeline.run("working on my notes").unwrap();
    assert!(pipeline.conversation_context().contains("notes"));

    pipeline.clear_context();
    assert!(pipeline.conversation_context().is_empty());
}

#[test]
fn test_context_biases_intent() {
    let mut pipeline = InputPipeline::new(test_config()).unwrap();
    pipeline.run("I'm working on my notes").unwrap();
    let (_, intent) = pipeline.run("the meeting one").unwrap();
    assert_eq!(intent.intent_type, IntentType::Note);
}

#[test]
fn test_shared_state_across_pipelines() {
    use crate::{RateLimiter, SecurityMonitor};

    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(2, 3600.0)).unwrap());
    let monitor = Arc::new(SecurityMonitor::new());

    let config = test_config().with_session_key("shared-user");
    let mut a = InputPipeline::with_shared_state(
        config.clone(),
        Arc::clone(&limiter),
        Arc::clone(&monitor),
    );
    let mut b = InputPipeline::with_shared_state(config, limiter, monitor);

    // Both pipelines draw on the same admission allowance
    assert!(a.run("one").is_ok());
    assert!(b.run("two").is_ok());
    assert!(a.run("three").is_err());
}

#[test]
fn test_html_context_hardens_output() {
    let config = test_config().with_sanitize_context(SanitizeContext::Html);
    let mut pipeline = InputPipeline::new(config).unwrap();
    let (text, _) = pipeline.run("<script>alert(1)</script>").unwrap();
    assert!(!text.to_lowercase().contains("<script"));
}

#[test]
fn test_limiter_checked_exactly_once_per_run() {
    // With a limit of 1, a single run must succeed even though it has
    // seven stages; a second run must be the one that trips the gate.
    let config = test_config().with_rate_limit(RateLimitConfig::new(1, 3600.0));
    let mut pipeline = InputPipeline::new(config).unwrap();

    assert!(pipeline.run("hello").is_ok());
    assert!(pipeline.run("world").is_err());
}
