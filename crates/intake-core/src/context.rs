//! Conversation context tracker.
//!
//! A bounded ring of recent sanitized inputs, used as a hint by the
//! intent classifier ("remind me about the meeting" after talking about
//! notes). Process-transient by design: nothing here is persisted, and
//! only sanitized text ever enters the ring.

use std::collections::VecDeque;

/// Bounded ring of recent sanitized inputs.
#[derive(Debug)]
pub struct ConversationContext {
    entries: VecDeque<String>,
    capacity: usize,
}

impl ConversationContext {
    /// Default number of turns retained.
    pub const DEFAULT_CAPACITY: usize = 5;

    /// Creates a tracker retaining `capacity` turns.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a sanitized input, evicting the oldest beyond capacity.
    pub fn push(&mut self, text: &str) {
        if self.capacity == 0 || text.is_empty() {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.to_string());
    }

    /// Recent turns joined oldest-first, for use as a classifier hint.
    #[must_use]
    pub fn snapshot(&self) -> String {
        let parts: Vec<&str> = self.entries.iter().map(String::as_str).collect();
        parts.join(" ")
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of turns currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no turns are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_snapshot() {
        let mut ctx = ConversationContext::default();
        ctx.push("first");
        ctx.push("second");
        assert_eq!(ctx.snapshot(), "first second");
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut ctx = ConversationContext::new(2);
        ctx.push("a");
        ctx.push("b");
        ctx.push("c");
        assert_eq!(ctx.snapshot(), "b c");
    }

    #[test]
    fn test_empty_input_ignored() {
        let mut ctx = ConversationContext::default();
        ctx.push("");
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut ctx = ConversationContext::default();
        ctx.push("something");
        ctx.clear();
        assert!(ctx.is_empty());
        assert_eq!(ctx.snapshot(), "");
    }

    #[test]
    fn test_zero_capacity() {
        let mut ctx = ConversationContext::new(0);
        ctx.push("ignored");
        assert!(ctx.is_empty());
    }
}
