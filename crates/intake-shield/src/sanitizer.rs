//! # Enhanced Input Sanitizer
//!
//! Context-aware hardening layer on top of the base pipeline stages.
//! The base stages detect the *presence* of an attack; this layer
//! guarantees the *output is safe for a specific sink*, because "safe
//! for SQL" and "safe for HTML" are different properties that no single
//! escaping pass can satisfy at once.
//!
//! ## Design
//!
//! One call runs four phases:
//!
//! 1. **Truncate** to the configured ceiling (DoS guard)
//! 2. **Canonicalize** via the base normalizer (encodings, invisibles,
//!    targeted confusable folding)
//! 3. **Detect and strip** the generic attack families (traversal,
//!    script, SQL, command), counting each confirmed family once per
//!    call in the [`SecurityMonitor`](crate::SecurityMonitor)
//! 4. **Harden for the sink**: entity-encode for `html`, quote-double
//!    and de-chain for `sql`, restrict the charset for `plain`, strip
//!    control characters for `general`
//!
//! ## Security Notes
//!
//! - Fail-open with maximal mitigation: this layer never rejects, it
//!   always returns a defanged string
//! - Counter increments happen only on confirmed detections, at most
//!   once per category per call

use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use intake_stages::{fold_confusables, PatternNormalizer};

use crate::monitor::{SecurityMonitor, SecuritySummary};

/// Attack-category labels used for counter accounting.
pub mod categories {
    /// Script/markup injection.
    pub const XSS: &str = "XSS";
    /// SQL metacharacter clusters.
    pub const SQL_INJECTION: &str = "SQL Injection";
    /// Directory traversal sequences.
    pub const PATH_TRAVERSAL: &str = "Path Traversal";
    /// Shell metacharacters and command chaining.
    pub const COMMAND_INJECTION: &str = "Command Injection";
    /// Invisible characters, bidi controls, homoglyph spoofing.
    pub const UNICODE_ATTACK: &str = "Unicode Attack";
    /// Input beyond the configured length ceiling.
    pub const OVERSIZED_INPUT: &str = "Oversized Input";
}

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*script[^>]*>.*?<\s*/\s*script\s*>").expect("static regex")
});
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*/?\s*script[^>]*>").expect("static regex"));
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("static regex"));
static SCRIPT_PROTOCOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(javascript|vbscript)\s*:").expect("static regex"));
static ACTIVE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(iframe|object|embed|applet|svg|meta|link|base)\b")
        .expect("static regex")
});

static SQL_SIGNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bunion\s+(all\s+)?select\b").expect("static regex"),
        Regex::new(r"(?i)'\s*(or|and)\s+['0-9]").expect("static regex"),
        Regex::new(r"(?i)\b(drop|truncate|delete)\s+(table|from)\b").expect("static regex"),
        Regex::new(r"(?i)\bwaitfor\s+delay\b").expect("static regex"),
        Regex::new(r"'[^']*--|;\s*--|'\s*;").expect("static regex"),
    ]
});
static SQL_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*|/\*.*?\*/").expect("static regex"));

static COMMAND_SIGNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\$\([^)]*\)|`[^`]+`").expect("static regex"),
        Regex::new(r"(;|\|\||&&|\|)\s*(rm|cat|curl|wget|chmod|chown|nc|sh|bash|powershell)\b")
            .expect("static regex"),
    ]
});

/// Rendering sink the output must be safe for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeContext {
    /// Output is rendered as HTML.
    Html,
    /// Output is interpolated into SQL.
    Sql,
    /// Output must be a plain identifier-like string.
    Plain,
    /// Output goes to a model or log; strip actives, keep prose.
    #[default]
    General,
}

impl FromStr for SanitizeContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "sql" => Ok(Self::Sql),
            "plain" => Ok(Self::Plain),
            "general" => Ok(Self::General),
            other => Err(format!("unknown sanitize context: {other}")),
        }
    }
}

/// Options for one sanitize call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeOptions {
    /// The sink to harden for.
    pub context: SanitizeContext,
    /// Apply the extra strict-mode restrictions.
    pub strict_mode: bool,
    /// Keep non-ASCII text (invisible characters are stripped either
    /// way when they splice identifiers).
    pub allow_unicode: bool,
    /// Truncation ceiling in characters.
    pub max_length: usize,
}

impl SanitizeOptions {
    /// Default ceiling on sanitized output, in characters.
    pub const DEFAULT_MAX_LENGTH: usize = 10_000;

    /// Creates options for the given sink with defaults otherwise.
    #[must_use]
    pub const fn for_context(context: SanitizeContext) -> Self {
        Self {
            context,
            strict_mode: false,
            allow_unicode: true,
            max_length: Self::DEFAULT_MAX_LENGTH,
        }
    }

    /// Enables strict mode.
    #[must_use]
    pub const fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Sets unicode tolerance.
    #[must_use]
    pub const fn with_allow_unicode(mut self, allow: bool) -> Self {
        self.allow_unicode = allow;
        self
    }

    /// Sets the truncation ceiling.
    #[must_use]
    pub const fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self::for_context(SanitizeContext::General)
    }
}

/// Tokens whose homoglyph spoofing justifies a targeted confusable
/// fold. Folding everything would mangle legitimate non-Latin prose.
const SPOOF_TARGETS: &[&str] = &["admin", "root", "system", "password", "sudo"];

/// Context-aware sanitizer with attack accounting.
///
/// # Thread Safety
///
/// Safe to share across threads; the only mutable state is the counter
/// map inside the shared [`SecurityMonitor`].
pub struct EnhancedInputSanitizer {
    monitor: Arc<SecurityMonitor>,
}

impl EnhancedInputSanitizer {
    /// Creates a sanitizer with its own monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::with_monitor(Arc::new(SecurityMonitor::new()))
    }

    /// Creates a sanitizer recording into a shared monitor.
    #[must_use]
    pub fn with_monitor(monitor: Arc<SecurityMonitor>) -> Self {
        Self { monitor }
    }

    /// The shared monitor handle.
    #[must_use]
    pub fn monitor(&self) -> Arc<SecurityMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Snapshot of the attack counters.
    #[must_use]
    pub fn security_summary(&self) -> SecuritySummary {
        self.monitor.summary()
    }

    /// Sanitizes `text` so the result is safe for the configured sink.
    ///
    /// Never fails; the worst input yields an empty or heavily stripped
    /// string. Each confirmed attack family increments its counter
    /// exactly once per call.
    #[must_use]
    pub fn sanitize_input(&self, text: &str, opts: &SanitizeOptions) -> String {
        let mut current = self.truncate(text, opts.max_length);

        // Canonicalize before any signature work.
        let normalizer = PatternNormalizer::new(opts.allow_unicode);
        let normalized = normalizer.normalize(&current);
        let mut unicode_hit = normalized.stripped_invisibles;
        current = normalized.text;

        // Targeted confusable fold: only when folding reveals a spoofed
        // sensitive token.
        let folded = fold_confusables(&current);
        if folded != current {
            let folded_lower = folded.to_lowercase();
            let current_lower = current.to_lowercase();
            if SPOOF_TARGETS
                .iter()
                .any(|t| folded_lower.contains(t) && !current_lower.contains(t))
            {
                unicode_hit = true;
                current = folded;
            }
        }
        if unicode_hit {
            self.monitor.record(categories::UNICODE_ATTACK);
        }

        current = self.strip_traversal(&current);
        current = self.strip_scripts(&current);
        current = self.strip_commands(&current);

        if SQL_SIGNS.iter().any(|p| p.is_match(&current)) {
            self.monitor.record(categories::SQL_INJECTION);
            debug!(context = ?opts.context, "SQL injection pattern neutralized");
        }

        current = match opts.context {
            SanitizeContext::Html => html_encode(&current),
            SanitizeContext::Sql => harden_sql(&current),
            SanitizeContext::Plain => restrict_plain(&current),
            SanitizeContext::General => strip_controls(&current),
        };

        if opts.strict_mode {
            current = apply_strict_mode(&current);
        }

        current
    }

    fn truncate(&self, text: &str, max_length: usize) -> String {
        if text.chars().count() > max_length {
            self.monitor.record(categories::OVERSIZED_INPUT);
            text.chars().take(max_length).collect()
        } else {
            text.to_string()
        }
    }

    fn strip_traversal(&self, text: &str) -> String {
        if !text.contains("../") && !text.contains("..\\") {
            return text.to_string();
        }
        self.monitor.record(categories::PATH_TRAVERSAL);
        let mut out = text.to_string();
        while out.contains("../") || out.contains("..\\") {
            out = out.replace("../", "").replace("..\\", "");
        }
        out
    }

    fn strip_scripts(&self, text: &str) -> String {
        let detected = SCRIPT_TAG.is_match(text)
            || EVENT_HANDLER.is_match(text)
            || SCRIPT_PROTOCOL.is_match(text)
            || ACTIVE_TAG.is_match(text);
        if !detected {
            return text.to_string();
        }
        self.monitor.record(categories::XSS);

        let out = SCRIPT_BLOCK.replace_all(text, "");
        let out = SCRIPT_TAG.replace_all(&out, "");
        let out = EVENT_HANDLER.replace_all(&out, "");
        let out = SCRIPT_PROTOCOL.replace_all(&out, "");
        ACTIVE_TAG.replace_all(&out, "").into_owned()
    }

    fn strip_commands(&self, text: &str) -> String {
        if !COMMAND_SIGNS.iter().any(|p| p.is_match(text)) {
            return text.to_string();
        }
        self.monitor.record(categories::COMMAND_INJECTION);
        // Remove the substitution and chaining syntax; the words stay.
        let mut out = text.replace('`', "").replace("$(", "(");
        out = out.replace("&&", " ").replace("||", " ");
        out
    }
}

impl Default for EnhancedInputSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML-entity encoding for the `html` sink.
fn html_encode(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('/', "&#x2F;")
}

/// Quote doubling and statement de-chaining for the `sql` sink.
fn harden_sql(text: &str) -> String {
    let without_comments = SQL_COMMENT.replace_all(text, "");
    without_comments
        .replace(';', "")
        .replace('\'', "''")
        .replace('"', "\"\"")
}

/// Identifier-charset restriction for the `plain` sink.
fn restrict_plain(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.'))
        .collect()
}

/// Control-character stripping for the `general` sink.
fn strip_controls(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Strict-mode extras: collapse runs of special characters and cap
/// character repetition, both common evasion paddings.
fn apply_strict_mode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last: Option<char> = None;
    let mut run = 0usize;
    let mut special_run = 0usize;

    for c in text.chars() {
        if last == Some(c) {
            run += 1;
        } else {
            run = 1;
            last = Some(c);
        }
        if run > 5 {
            continue;
        }

        let is_special = !c.is_alphanumeric() && !c.is_whitespace();
        if is_special {
            special_run += 1;
            if special_run > 3 {
                continue;
            }
        } else {
            special_run = 0;
        }
        out.push(c);
    }
    out
}
