//! # Intent Classification
//!
//! Rule-based classification of sanitized text into the intent category
//! the calling agent uses to decide tool-use eligibility. Runs after
//! escaping and filtering, so classification never sees attack
//! payloads, only cleaned content.
//!
//! Confidence is derived from the number and specificity of matched
//! patterns, normalized to [0, 1]. The category set is closed; anything
//! unmatched is [`IntentType::General`].

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of intent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IntentType {
    /// Interrogative input expecting an answer.
    Question,
    /// Imperative input requesting an action.
    Command,
    /// Note-taking request.
    Note,
    /// Timer or reminder request.
    Timer,
    /// Search or lookup request.
    Search,
    /// Request for usage help.
    Help,
    /// Anything else.
    #[default]
    General,
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Question => "question",
            Self::Command => "command",
            Self::Note => "note",
            Self::Timer => "timer",
            Self::Search => "search",
            Self::Help => "help",
            Self::General => "general",
        };
        f.write_str(s)
    }
}

/// A classified intent with its evidence.
///
/// Created once per pipeline run, consumed by the calling agent, never
/// persisted inside the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// The winning category.
    pub intent_type: IntentType,
    /// Confidence in [0, 1], from matched pattern weights.
    pub confidence: f64,
    /// Descriptions of the patterns that matched.
    pub matched_patterns: Vec<String>,
}

impl Intent {
    /// The unmatched default: General with zero evidence.
    #[must_use]
    pub fn general() -> Self {
        Self {
            intent_type: IntentType::General,
            confidence: 0.0,
            matched_patterns: Vec::new(),
        }
    }
}

/// A keyword pattern voting for one category with a given weight.
struct IntentPattern {
    pattern: Regex,
    intent: IntentType,
    weight: f64,
    description: &'static str,
}

/// Keyword/rule classifier over sanitized text.
///
/// # Thread Safety
///
/// Stateless after construction; safe to share across threads.
pub struct IntentClassifier {
    patterns: Vec<IntentPattern>,
}

impl IntentClassifier {
    /// Creates a classifier with the built-in rule set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: Self::build_patterns(),
        }
    }

    fn build_patterns() -> Vec<IntentPattern> {
        vec![
            IntentPattern {
                pattern: Regex::new(
                    r"(?i)^\s*(who|what|when|where|why|how|is|are|can|could|do|does|did|will|would|should)\b",
                )
                .expect("static regex"),
                intent: IntentType::Question,
                weight: 0.6,
                description: "leading interrogative",
            },
            IntentPattern {
                pattern: Regex::new(r"\?\s*$").expect("static regex"),
                intent: IntentType::Question,
                weight: 0.5,
                description: "trailing question mark",
            },
            IntentPattern {
                pattern: Regex::new(r"^\s*[/!]\w+").expect("static regex"),
                intent: IntentType::Command,
                weight: 0.9,
                description: "explicit command prefix",
            },
            IntentPattern {
                pattern: Regex::new(
                    r"(?i)^\s*(open|run|execute|start|stop|show|list|create|delete|set|make|add|remove|clear|update)\b",
                )
                .expect("static regex"),
                intent: IntentType::Command,
                weight: 0.5,
                description: "leading imperative verb",
            },
            IntentPattern {
                pattern: Regex::new(r"(?i)\b(note|notes|write\s+down|jot|memo)\b")
                    .expect("static regex"),
                intent: IntentType::Note,
                weight: 0.7,
                description: "note keyword",
            },
            IntentPattern {
                pattern: Regex::new(r"(?i)\b(timer|remind(er)?|alarm|countdown)\b")
                    .expect("static regex"),
                intent: IntentType::Timer,
                weight: 0.7,
                description: "timer keyword",
            },
            IntentPattern {
                pattern: Regex::new(r"(?i)\bin\s+\d+\s+(seconds?|minutes?|hours?)\b")
                    .expect("static regex"),
                intent: IntentType::Timer,
                weight: 0.4,
                description: "duration phrase",
            },
            IntentPattern {
                pattern: Regex::new(r"(?i)\b(search|find|look\s+up|lookup|query)\b")
                    .expect("static regex"),
                intent: IntentType::Search,
                weight: 0.7,
                description: "search keyword",
            },
            IntentPattern {
                pattern: Regex::new(r"(?i)\b(help|how\s+do\s+i|how\s+to|usage|instructions)\b")
                    .expect("static regex"),
                intent: IntentType::Help,
                weight: 0.6,
                description: "help keyword",
            },
        ]
    }

    /// Classifies sanitized text.
    #[must_use]
    pub fn classify(&self, text: &str) -> Intent {
        self.classify_with_context(text, "")
    }

    /// Classifies with a conversation-context hint.
    ///
    /// The hint only matters when the text itself is inconclusive: a
    /// domain keyword in recent context breaks the tie at reduced
    /// confidence.
    #[must_use]
    pub fn classify_with_context(&self, text: &str, context: &str) -> Intent {
        if text.trim().is_empty() {
            return Intent::general();
        }

        let mut scores: Vec<(IntentType, f64, Vec<String>)> = Vec::new();
        for pattern in &self.patterns {
            if pattern.pattern.is_match(text) {
                match scores.iter_mut().find(|(t, _, _)| *t == pattern.intent) {
                    Some((_, weight, descs)) => {
                        *weight += pattern.weight;
                        descs.push(pattern.description.to_string());
                    }
                    None => scores.push((
                        pattern.intent,
                        pattern.weight,
                        vec![pattern.description.to_string()],
                    )),
                }
            }
        }

        // Domain categories outrank the generic Question/Command vote:
        // "set a timer" is a Timer first, a Command second.
        let winner = scores
            .iter()
            .max_by(|a, b| {
                let rank_a = (domain_rank(a.0), a.1);
                let rank_b = (domain_rank(b.0), b.1);
                rank_a.partial_cmp(&rank_b).unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned();

        match winner {
            Some((intent_type, weight, matched_patterns)) => Intent {
                intent_type,
                confidence: weight.min(1.0),
                matched_patterns,
            },
            None => self.context_fallback(context),
        }
    }

    /// Weak classification from recent context when the text itself
    /// matched nothing.
    fn context_fallback(&self, context: &str) -> Intent {
        if context.is_empty() {
            return Intent::general();
        }
        for pattern in &self.patterns {
            if domain_rank(pattern.intent) == 1 && pattern.pattern.is_match(context) {
                return Intent {
                    intent_type: pattern.intent,
                    confidence: 0.3,
                    matched_patterns: vec![format!("{} (from context)", pattern.description)],
                };
            }
        }
        Intent::general()
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Domain categories (1) outrank the generic ones (0) at equal weight.
const fn domain_rank(intent: IntentType) -> u8 {
    match intent {
        IntentType::Note | IntentType::Timer | IntentType::Search | IntentType::Help => 1,
        IntentType::Question | IntentType::Command | IntentType::General => 0,
    }
}

/// Convenience wrapper over a fresh classifier.
#[must_use]
pub fn classify_intent(text: &str) -> Intent {
    IntentClassifier::new().classify(text)
}
