//! # Profanity Filtering
//!
//! Lexical scan against a severity-tiered term list with word-boundary
//! matching and leetspeak folding. Produces masked text plus a match
//! list for telemetry; never blocks on its own — severity feeds the
//! aggregate decision only where the pipeline is configured to use it.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pattern::FuzzyMatcher;

/// Replacement for every matched term, regardless of its length. A
/// fixed-length mask leaks neither the term nor its size.
const MASK: &str = "****";

/// Severity tier of a lexicon entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Mild language, masked and logged.
    Low,
    /// Clearly offensive, masked and surfaced to the caller.
    Moderate,
    /// Slurs and abuse; can veto the request when configured.
    Severe,
}

/// One lexicon hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfanityMatch {
    /// Canonical lexicon term that matched (not the surface form).
    pub term: String,
    /// Severity tier of the term.
    pub severity: Severity,
    /// Character span of the surface form in the original text.
    pub span: (usize, usize),
}

/// Outcome of a filter pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// All hits, in text order.
    pub matches: Vec<ProfanityMatch>,
    /// Input with every hit replaced by the mask.
    pub filtered_text: String,
}

impl FilterResult {
    /// Highest severity among the matches, if any.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.matches.iter().map(|m| m.severity).max()
    }
}

/// Built-in lexicon. Deliberately small; the filter is a mitigation
/// layer, not a moderation product.
const LEXICON: &[(&str, Severity)] = &[
    ("damn", Severity::Low),
    ("hell", Severity::Low),
    ("crap", Severity::Low),
    ("badword", Severity::Moderate),
    ("bastard", Severity::Moderate),
    ("shit", Severity::Moderate),
    ("bitch", Severity::Severe),
    ("fuck", Severity::Severe),
];

struct LexiconEntry {
    term: &'static str,
    severity: Severity,
    pattern: Regex,
}

/// Word-boundary lexical filter with leetspeak folding.
///
/// Matching runs over the folded text (lowercased, substitutions
/// reversed); folding maps one char to one char, so match positions in
/// the folded text line up with char positions in the original.
pub struct ProfanityFilter {
    entries: Vec<LexiconEntry>,
}

impl ProfanityFilter {
    /// Creates a filter over the built-in lexicon.
    #[must_use]
    pub fn new() -> Self {
        let entries = LEXICON
            .iter()
            .map(|(term, severity)| LexiconEntry {
                term,
                severity: *severity,
                pattern: Regex::new(&format!(r"\b{}\b", regex::escape(term)))
                    .expect("static regex"),
            })
            .collect();
        Self { entries }
    }

    /// Scans `text` and returns the masked result plus matches.
    #[must_use]
    pub fn filter(&self, text: &str) -> FilterResult {
        let folded = FuzzyMatcher::fold(text);
        let mut hits: Vec<ProfanityMatch> = Vec::new();

        for entry in &self.entries {
            for m in entry.pattern.find_iter(&folded) {
                let start = folded[..m.start()].chars().count();
                let end = start + folded[m.start()..m.end()].chars().count();
                hits.push(ProfanityMatch {
                    term: entry.term.to_string(),
                    severity: entry.severity,
                    span: (start, end),
                });
            }
        }

        hits.sort_by_key(|m| m.span);
        // Overlaps cannot happen with word-boundary terms, but a merged
        // mask is still the right behavior if the lexicon ever grows
        // overlapping entries.
        let filtered_text = mask_spans(text, &hits);

        FilterResult {
            matches: hits,
            filtered_text,
        }
    }
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Replaces each span (char indices) with the fixed mask.
fn mask_spans(text: &str, hits: &[ProfanityMatch]) -> String {
    if hits.is_empty() {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    for hit in hits {
        let (start, end) = hit.span;
        if start < cursor {
            continue; // overlap already masked
        }
        out.extend(&chars[cursor..start]);
        out.push_str(MASK);
        cursor = end;
    }
    out.extend(&chars[cursor..]);
    out
}

/// Convenience wrapper over a fresh filter.
#[must_use]
pub fn filter_profanity(text: &str) -> FilterResult {
    ProfanityFilter::new().filter(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_untouched() {
        let f = ProfanityFilter::new();
        let result = f.filter("a perfectly polite sentence");
        assert!(result.matches.is_empty());
        assert_eq!(result.filtered_text, "a perfectly polite sentence");
        assert_eq!(result.max_severity(), None);
    }

    #[test]
    fn test_basic_match_masked() {
        let f = ProfanityFilter::new();
        let result = f.filter("this contains badword content");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].term, "badword");
        assert_eq!(result.matches[0].severity, Severity::Moderate);
        assert_eq!(result.filtered_text, "this contains **** content");
    }

    #[test]
    fn test_case_insensitive() {
        let f = ProfanityFilter::new();
        let result = f.filter("BadWord");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.filtered_text, "****");
    }

    #[test]
    fn test_leetspeak_folded() {
        let f = ProfanityFilter::new();
        let result = f.filter("such a b@dw0rd here");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].term, "badword");
        assert_eq!(result.filtered_text, "such a **** here");
    }

    #[test]
    fn test_word_boundary_respected() {
        let f = ProfanityFilter::new();
        // "hello" contains "hell" but not on a word boundary
        let result = f.filter("hello there");
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_multiple_matches_in_order() {
        let f = ProfanityFilter::new();
        let result = f.filter("damn, that badword again");
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].term, "damn");
        assert_eq!(result.matches[1].term, "badword");
        assert_eq!(result.filtered_text, "****, that **** again");
        assert_eq!(result.max_severity(), Some(Severity::Moderate));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Severe);
    }

    #[test]
    fn test_span_is_char_indexed() {
        let f = ProfanityFilter::new();
        // Multibyte char before the term must not skew the span.
        let result = f.filter("café damn");
        assert_eq!(result.matches[0].span, (5, 9));
        assert_eq!(result.filtered_text, "café ****");
    }

    #[test]
    fn test_convenience_fn() {
        let result = filter_profanity("badword");
        assert_eq!(result.filtered_text, "****");
    }
}
