//! Markdown stripping for text handed to speech synthesis.
//!
//! Recognised markers, each with non-empty inner content that does not start
//! or end with whitespace and does not span lines:
//!
//! * paired `**bold**`
//! * paired `__bold__` delimited by non-word characters
//! * paired `*italic*` delimited by non-word characters, so `2*3*4` survives
//! * paired `_italic_` delimited by non-word characters, so `co_2` and
//!   `snake_case` survive
//! * paired single backticks
//! * code fence lines (```` ``` ````)
//! * ATX headings (`#` to `######` followed by whitespace at line start)
//! * links `[text](url)`, reduced to `text`
//!
//! Inner content is kept verbatim. Rules are applied until nothing changes,
//! so the result is a fixpoint.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

// ── Rules ─────────────────────────────────────────────────────────────────────

struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("regex is valid"),
            replacement,
        }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("fence", r"(?m)^[ \t]*```[^\n]*(?:\n|$)", ""),
        Rule::new("heading", r"(?m)^[ \t]{0,3}#{1,6}[ \t]+", ""),
        Rule::new("link", r"\[([^\[\]\n]+)\]\([^()\s]*\)", "${1}"),
        Rule::new("bold_star", r"\*\*([^\s*](?:[^*\n]*[^\s*])?)\*\*", "${1}"),
        Rule::new(
            "bold_underscore",
            r"(^|[^\w])__([^\s_](?:[^_\n]*[^\s_])?)__([^\w]|$)",
            "${1}${2}${3}",
        ),
        Rule::new(
            "italic_star",
            r"(^|[^\w*])\*([^\s*](?:[^*\n]*[^\s*])?)\*([^\w*]|$)",
            "${1}${2}${3}",
        ),
        Rule::new(
            "italic_underscore",
            r"(^|[^\w])_([^\s_](?:[^_\n]*[^\s_])?)_([^\w]|$)",
            "${1}${2}${3}",
        ),
        Rule::new("code", r"`([^`\n]+)`", "${1}"),
    ]
});

// ── MarkdownSanitizer ─────────────────────────────────────────────────────────

/// Strips markdown emphasis and structure markers from generated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownSanitizer;

impl MarkdownSanitizer {
    /// Remove every recognised marker, keeping inner content verbatim.
    pub fn sanitize(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let mut changed = false;
            for rule in RULES.iter() {
                // Every match removes at least one character, so an owned
                // result always differs from its input.
                if let Cow::Owned(next) = rule.pattern.replace_all(&current, rule.replacement) {
                    trace!("sanitize: applied rule {}", rule.name);
                    current = next;
                    changed = true;
                }
            }
            if !changed {
                return current;
            }
        }
    }
}

/// Shorthand for [`MarkdownSanitizer::sanitize`].
pub fn sanitize_markdown(text: &str) -> String {
    MarkdownSanitizer.sanitize(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
