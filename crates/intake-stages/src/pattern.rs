//! # Pattern Normalization
//!
//! Canonicalizes untrusted text before any signature matching runs.
//! Attackers hide payloads behind encodings the validator would never
//! enumerate on its own; this module folds those encodings down to one
//! canonical representation so every later stage sees the same string.
//!
//! ## Threat Model
//!
//! Normalization defeats three evasion families:
//! - **Encoded separators**: `%2e%2e%2f`, double/triple URL encoding,
//!   full-width slash variants hiding `../` from literal matching
//! - **Invisible characters**: zero-width joiners, BOM, bidirectional
//!   overrides spliced into identifiers (`admin\u{200b}`)
//! - **Compatibility forms**: ligatures, mathematical alphanumerics and
//!   full-width letters that survive naive blocklists
//!
//! ## Design
//!
//! A single pass applies NFKC compatibility normalization, one layer of
//! percent-decoding, separator canonicalization and invisible-character
//! stripping. Passes repeat until the text stops changing, capped at
//! [`MAX_PASSES`]. A string still changing at the cap is recursively
//! encoded beyond reason; it is reported unstable so the validator can
//! escalate rather than loop forever.
//!
//! ## Security Notes
//!
//! - Normalization MUST run before signature validation
//! - `normalize` never fails; worst case it returns the input unchanged
//!   with `stable == false`
//! - A second `normalize` of already-normalized text is a no-op
//!
//! ## Example
//!
//! ```rust
//! use intake_stages::PatternNormalizer;
//!
//! let normalizer = PatternNormalizer::new(true);
//! let out = normalizer.normalize("%2e%2e%2fetc%2fpasswd");
//! assert_eq!(out.text, "../etc/passwd");
//! assert!(out.stable);
//! ```

use regex::Regex;

use unicode_normalization::UnicodeNormalization;

/// Maximum normalization passes before giving up on a string that keeps
/// changing. Anything needing more layers than this is an attack, not a
/// legitimate input.
pub const MAX_PASSES: u8 = 3;

/// Zero-width and joiner characters abused to split blocklisted tokens.
const INVISIBLES: &[char] = &[
    '\u{200b}', // zero-width space
    '\u{200c}', // zero-width non-joiner
    '\u{200d}', // zero-width joiner
    '\u{2060}', // word joiner
    '\u{feff}', // zero-width no-break space / BOM
];

/// Bidirectional control characters used to visually reorder payloads.
const BIDI_CONTROLS: &[char] = &[
    '\u{202a}', '\u{202b}', '\u{202c}', '\u{202d}', '\u{202e}', // embeds/overrides
    '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}', // isolates
];

/// Outcome of a normalization run.
///
/// `stable` is the signal consumed by the validator: `false` means the
/// text was still changing when the pass cap was hit, which marks an
/// exhausted recursive encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The canonicalized text.
    pub text: String,
    /// Whether the text reached a fixed point within the pass cap.
    pub stable: bool,
    /// Number of passes actually executed.
    pub passes: u8,
    /// Whether invisible/bidi characters were removed.
    pub stripped_invisibles: bool,
}

/// Canonicalizes Unicode, encodings and separator obfuscation.
///
/// # Thread Safety
///
/// Stateless after construction; safe to share across threads.
pub struct PatternNormalizer {
    allow_unicode: bool,
    traversal_collapse: Regex,
}

impl PatternNormalizer {
    /// Creates a normalizer.
    ///
    /// With `allow_unicode` set, invisible characters are stripped only
    /// when adjacent to identifier-like runs (the confusable heuristic);
    /// without it they are stripped unconditionally.
    #[must_use]
    pub fn new(allow_unicode: bool) -> Self {
        Self {
            allow_unicode,
            // "..", any mix of slashes/backslashes -> canonical "../"
            traversal_collapse: Regex::new(r"\.\.[/\\]+").expect("static regex"),
        }
    }

    /// Normalizes `text` to its canonical form.
    ///
    /// Never fails. Repeats single passes until a fixed point or
    /// [`MAX_PASSES`], whichever comes first.
    #[must_use]
    pub fn normalize(&self, text: &str) -> Normalized {
        let mut current = text.to_string();
        let mut stripped_invisibles = false;
        let mut passes = 0u8;
        let mut stable = true;

        loop {
            let (next, stripped) = self.normalize_once(&current);
            passes += 1;
            stripped_invisibles |= stripped;

            if next == current {
                break;
            }
            current = next;

            if passes >= MAX_PASSES {
                // Still changing at the cap: check one more time whether
                // the last pass happened to land on a fixed point.
                let (probe, _) = self.normalize_once(&current);
                stable = probe == current;
                break;
            }
        }

        Normalized {
            text: current,
            stable,
            passes,
            stripped_invisibles,
        }
    }

    /// One canonicalization pass: NFKC, one percent-decode layer,
    /// separator collapse, invisible stripping.
    fn normalize_once(&self, text: &str) -> (String, bool) {
        let folded: String = text.nfkc().collect();
        let decoded = percent_decode_once(&folded);
        let collapsed = self.traversal_collapse.replace_all(&decoded, "../");
        self.strip_invisibles(&collapsed)
    }

    /// Removes zero-width and bidi control characters.
    ///
    /// When unicode is allowed, only characters touching an ASCII
    /// alphanumeric neighbor are removed: an invisible spliced into an
    /// identifier-like run is an evasion, a lone one in prose is noise.
    fn strip_invisibles(&self, text: &str) -> (String, bool) {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut stripped = false;

        for (i, &ch) in chars.iter().enumerate() {
            if !is_invisible(ch) {
                out.push(ch);
                continue;
            }
            if !self.allow_unicode || self.adjacent_to_identifier(&chars, i) {
                stripped = true;
            } else {
                out.push(ch);
            }
        }
        (out, stripped)
    }

    /// True if the nearest non-invisible neighbor on either side is an
    /// ASCII alphanumeric (an identifier-like run).
    fn adjacent_to_identifier(&self, chars: &[char], idx: usize) -> bool {
        let before = chars[..idx]
            .iter()
            .rev()
            .find(|c| !is_invisible(**c))
            .is_some_and(|c| c.is_ascii_alphanumeric());
        let after = chars[idx + 1..]
            .iter()
            .find(|c| !is_invisible(**c))
            .is_some_and(|c| c.is_ascii_alphanumeric());
        before || after
    }
}

impl Default for PatternNormalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

fn is_invisible(ch: char) -> bool {
    INVISIBLES.contains(&ch) || BIDI_CONTROLS.contains(&ch)
}

/// Decodes one layer of %XX percent-encoding.
///
/// Invalid sequences pass through untouched. Decoding exactly one layer
/// per pass lets the pass loop unwind double and triple encoding while
/// the cap bounds the work.
fn percent_decode_once(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    // Decoded bytes may not be valid UTF-8 (overlong encodings, raw
    // continuation bytes). Lossy conversion maps those to U+FFFD, which
    // the validator treats as suspicious rather than letting the raw
    // bytes through.
    String::from_utf8(out.clone()).unwrap_or_else(|_| String::from_utf8_lossy(&out).into_owned())
}

/// Folds common leetspeak substitutions back to their base letters.
///
/// Used by the profanity filter so `b@dw0rd` matches the same lexicon
/// entry as `badword`. Every mapping is one char to one char, so char
/// indices line up between the original and folded text.
pub struct FuzzyMatcher;

impl FuzzyMatcher {
    /// Folds substitutions and lowercases the text.
    #[must_use]
    pub fn fold(text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '@' | '4' => 'a',
                '3' => 'e',
                '0' => 'o',
                '1' | '!' => 'i',
                '$' | '5' => 's',
                '7' => 't',
                other => other.to_ascii_lowercase(),
            })
            .collect()
    }

    /// True if `needle` occurs in `haystack` after folding both sides.
    #[must_use]
    pub fn fuzzy_contains(haystack: &str, needle: &str) -> bool {
        Self::fold(haystack).contains(&Self::fold(needle))
    }
}

/// Folds cross-script homoglyphs to their ASCII lookalikes.
///
/// Covers the Cyrillic and Greek confusables seen in real credential
/// spoofing; compatibility forms (full-width, mathematical) are already
/// handled by NFKC in the normalizer.
#[must_use]
pub fn fold_confusables(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'а' | 'ɑ' | 'α' => 'a', // Cyrillic a, IPA alpha, Greek alpha
            'е' | 'ε' => 'e',
            'і' | 'ι' => 'i',
            'о' | 'ο' => 'o',
            'р' | 'ρ' => 'p',
            'с' => 'c',
            'ѕ' => 's',
            'у' => 'y',
            'х' => 'x',
            'ԁ' | 'ⅾ' => 'd',
            'м' => 'm',
            'н' => 'h',
            'п' => 'n',
            other => other,
        })
        .collect()
}

/// Convenience wrapper: normalize with unicode allowed, return the text.
#[must_use]
pub fn normalize_input(text: &str) -> String {
    PatternNormalizer::default().normalize(text).text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        let n = PatternNormalizer::default();
        let out = n.normalize("hello world");
        assert_eq!(out.text, "hello world");
        assert!(out.stable);
        assert!(!out.stripped_invisibles);
    }

    #[test]
    fn test_url_encoded_traversal() {
        let n = PatternNormalizer::default();
        let out = n.normalize("%2e%2e%2fetc%2fpasswd");
        assert_eq!(out.text, "../etc/passwd");
    }

    #[test]
    fn test_double_encoded_traversal() {
        let n = PatternNormalizer::default();
        let out = n.normalize("%252e%252e%252fetc%252fpasswd");
        assert_eq!(out.text, "../etc/passwd");
        assert!(out.stable);
    }

    #[test]
    fn test_mixed_separator_collapse() {
        let n = PatternNormalizer::default();
        assert_eq!(n.normalize("..//..//etc//passwd").text, "../../etc//passwd");
        assert_eq!(n.normalize("..\\windows").text, "../windows");
    }

    #[test]
    fn test_fullwidth_slash_canonicalized() {
        let n = PatternNormalizer::default();
        // NFKC maps U+FF0F to '/'
        let out = n.normalize("..\u{ff0f}etc\u{ff0f}passwd");
        assert_eq!(out.text, "../etc/passwd");
    }

    #[test]
    fn test_zero_width_stripped_without_unicode() {
        let n = PatternNormalizer::new(false);
        assert_eq!(n.normalize("admin\u{200b}").text, "admin");
        assert_eq!(n.normalize("ad\u{200c}min").text, "admin");
        assert!(n.normalize("admin\u{feff}").stripped_invisibles);
    }

    #[test]
    fn test_zero_width_in_identifier_stripped_with_unicode() {
        // Confusable heuristic: invisible inside an identifier run goes
        // even when unicode is otherwise allowed.
        let n = PatternNormalizer::new(true);
        assert_eq!(n.normalize("ad\u{200b}min").text, "admin");
    }

    #[test]
    fn test_bidi_override_stripped() {
        let n = PatternNormalizer::new(false);
        assert_eq!(n.normalize("\u{202e}admin").text, "admin");
    }

    #[test]
    fn test_idempotence() {
        let n = PatternNormalizer::default();
        let inputs = [
            "hello",
            "%2e%2e%2fetc",
            "..\u{ff0f}x",
            "admin\u{200b}",
            "café",
            "ﬁle", // fi ligature
        ];
        for input in inputs {
            let once = n.normalize(input).text;
            let twice = n.normalize(&once).text;
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_invalid_percent_passthrough() {
        let n = PatternNormalizer::default();
        assert_eq!(n.normalize("100% sure").text, "100% sure");
        assert_eq!(n.normalize("%zz").text, "%zz");
    }

    #[test]
    fn test_security_triple_encoding_unstable() {
        // Four encoding layers cannot fully unwind within the pass cap;
        // the result must be flagged unstable.
        let n = PatternNormalizer::default();
        let mut payload = "../".to_string();
        for _ in 0..4 {
            payload = payload
                .chars()
                .flat_map(|c| format!("%{:02x}", c as u32).chars().collect::<Vec<_>>())
                .collect();
        }
        let out = n.normalize(&payload);
        assert!(!out.stable, "deeply encoded payload should be unstable");
    }

    #[test]
    fn test_fuzzy_fold() {
        assert_eq!(FuzzyMatcher::fold("B@dw0rd"), "badword");
        assert!(FuzzyMatcher::fuzzy_contains("b4dWord here", "badword"));
        assert!(!FuzzyMatcher::fuzzy_contains("goodword", "badword"));
    }

    #[test]
    fn test_confusable_fold() {
        assert_eq!(fold_confusables("аdmin"), "admin"); // Cyrillic а
        assert_eq!(fold_confusables("αdmιn"), "admin"); // Greek
        assert_eq!(fold_confusables("plain"), "plain");
    }

    #[test]
    fn test_mathematical_alphanumerics_folded() {
        // NFKC folds mathematical sans-serif to ASCII
        let n = PatternNormalizer::default();
        assert_eq!(n.normalize("𝖺𝖽𝗆𝗂𝗇").text, "admin");
    }

    #[test]
    fn test_normalize_input_convenience() {
        assert_eq!(normalize_input("%2e%2e%2f"), "../");
    }
}
