//! # Model-Specific Escaping
//!
//! Neutralizes sequences that a downstream model's prompt protocol would
//! parse as role or turn delimiters. Different model APIs reserve
//! different control tokens inside a text blob, so a single escaping
//! scheme either under- or over-escapes; each strategy here targets one
//! protocol's token set and is independently testable against it.
//!
//! The strategy set is a tagged enum with an exhaustive match per
//! variant, so adding a strategy is a compile-time checked change.

use serde::{Deserialize, Serialize};

/// Escaping strategy, selected from a model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EscapeStrategy {
    /// Generic HTML-entity escaping of `&`, `<`, `>`. Applied when no
    /// provider-specific rule matches the model identifier.
    #[default]
    Default,
    /// Anthropic-style protocols: turn markers (`Human:`, `Assistant:`)
    /// and angle-bracket tags are live syntax.
    Claude,
    /// OpenAI-style protocols: code fences and `<|im_start|>` /
    /// `<|im_end|>` tokens are live syntax.
    Gpt,
}

impl EscapeStrategy {
    /// Selects a strategy from a model identifier string.
    ///
    /// Unknown identifiers select [`EscapeStrategy::Default`].
    #[must_use]
    pub fn from_model_id(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();
        if id.contains("claude") || id.contains("anthropic") {
            Self::Claude
        } else if id.contains("gpt") || id.contains("openai") {
            Self::Gpt
        } else {
            Self::Default
        }
    }

    /// The raw delimiter tokens this strategy must never emit.
    ///
    /// Exposed for tests: for all inputs, escaped output contains none
    /// of these.
    #[must_use]
    pub const fn reserved_tokens(&self) -> &'static [&'static str] {
        match self {
            Self::Default => &["<script"],
            Self::Claude => &["Human:", "Assistant:", "<script"],
            Self::Gpt => &["<|im_start|>", "<|im_end|>", "```"],
        }
    }
}

/// Escapes text for a specific downstream model protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEscaper {
    strategy: EscapeStrategy,
}

impl TextEscaper {
    /// Creates an escaper with the given strategy.
    #[must_use]
    pub const fn new(strategy: EscapeStrategy) -> Self {
        Self { strategy }
    }

    /// Creates an escaper for the given model identifier.
    #[must_use]
    pub fn for_model(model_id: &str) -> Self {
        Self::new(EscapeStrategy::from_model_id(model_id))
    }

    /// The active strategy.
    #[must_use]
    pub const fn strategy(&self) -> EscapeStrategy {
        self.strategy
    }

    /// Escapes all sequences reserved by the active strategy.
    #[must_use]
    pub fn escape(&self, text: &str) -> String {
        match self.strategy {
            EscapeStrategy::Default => escape_entities(text),
            EscapeStrategy::Claude => {
                // Entity escaping first: it removes the angle brackets,
                // then the turn-marker colons are defused so a line can
                // never be parsed as a role switch.
                escape_entities(text)
                    .replace("Human:", "Human&#58;")
                    .replace("Assistant:", "Assistant&#58;")
            }
            EscapeStrategy::Gpt => text
                .replace("```", "\\`\\`\\`")
                .replace("<|", "&lt;|")
                .replace("|>", "|&gt;"),
        }
    }
}

/// HTML-entity escaping of the characters every strategy treats as
/// markup. Ampersand first so entities are not double-escaped.
fn escape_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convenience wrapper: escape `text` for the model named by `model_id`.
#[must_use]
pub fn escape_for_model(text: &str, model_id: &str) -> String {
    TextEscaper::for_model(model_id).escape(text)
}
