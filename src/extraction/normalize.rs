//! Whitespace normalization applied to converter output.

use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    whitespace: Regex,
    blank_lines: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        blank_lines: Regex::new(r"\n\s*\n").expect("blank line pattern is valid"),
    })
}

/// Normalize extracted text.
///
/// Rules run in a fixed order: whitespace runs become one space, blank-line runs become
/// one line break, `\r\n` becomes `\n`, tabs become spaces, then the result is trimmed.
/// The first rule already folds line breaks and tabs, so the later rules only matter if
/// it is ever relaxed.
pub fn normalize_text(raw: &str) -> String {
    let patterns = patterns();
    let collapsed = patterns.whitespace.replace_all(raw, " ");
    let collapsed = patterns.blank_lines.replace_all(&collapsed, "\n");
    collapsed
        .replace("\r\n", "\n")
        .replace('\t', " ")
        .trim()
        .to_string()
}
