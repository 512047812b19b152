//! Heading anchors, computed the way GitHub renders them.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap());

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());

static INLINE_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]*)`").unwrap());

static HTML_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").unwrap());

static ATX_CLOSING_HASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+#+\s*$").unwrap());

/// A heading found in a markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Line number (1-indexed).
    pub line: usize,
    /// 1-6 for ATX headings; setext headings report 1 (`===`) or 2 (`---`).
    pub level: usize,
    pub text: String,
    /// Anchor without the leading `#`, including any `-N` duplicate suffix.
    pub anchor: String,
}

/// Compute the anchor GitHub generates for a heading's text.
///
/// `"Rules as Code"` → `"rules-as-code"`, `"Spec-Driven Development"` →
/// `"spec-driven-development"`. Returns an empty string when nothing
/// survives (e.g. a heading made only of punctuation).
pub fn heading_anchor(text: &str) -> String {
    let text = strip_markdown_formatting(text.trim());
    let text = unescape_entities(&text);
    let lowered = text.trim().to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('-');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        }
    }

    out.trim_matches('-').to_string()
}

fn strip_markdown_formatting(text: &str) -> String {
    let text = IMAGE_PATTERN.replace_all(text, "$1");
    let text = LINK_PATTERN.replace_all(&text, "$1");
    let text = INLINE_CODE_PATTERN.replace_all(&text, "$1");
    let text = text
        .replace("**", "")
        .replace("__", "")
        .replace(['*', '_'], "");
    HTML_TAG_PATTERN.replace_all(&text, "").to_string()
}

fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// True when the line opens or closes a fenced code block.
pub fn is_fence(line: &str) -> bool {
    let stripped = line.trim_start();
    stripped.starts_with("```") || stripped.starts_with("~~~")
}

fn strip_blockquote_prefix(line: &str) -> &str {
    let mut out = line.trim_start();
    while let Some(rest) = out.strip_prefix('>') {
        out = rest.trim_start();
    }
    out
}

fn is_setext_underline(line: &str, marker: char) -> bool {
    !line.is_empty() && line.chars().all(|c| c == marker)
}

/// Extract every heading outside fenced code blocks, with duplicate anchors
/// suffixed `-1`, `-2`, ... in document order.
pub fn extract_headings(content: &str) -> Vec<Heading> {
    let lines: Vec<&str> = content.lines().collect();
    let mut headings = Vec::new();
    let mut slug_counts: HashMap<String, usize> = HashMap::new();
    let mut in_fence = false;

    let mut push = |line: usize, level: usize, text: &str, headings: &mut Vec<Heading>| {
        let base = heading_anchor(text);
        if base.is_empty() {
            return;
        }
        let count = slug_counts.entry(base.clone()).or_insert(0);
        let anchor = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        headings.push(Heading {
            line,
            level,
            text: text.to_string(),
            anchor,
        });
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if is_fence(line) {
            in_fence = !in_fence;
            i += 1;
            continue;
        }
        if in_fence {
            i += 1;
            continue;
        }

        let normalized = strip_blockquote_prefix(line).trim();

        if let Some(caps) = ATX_HEADING.captures(normalized) {
            let level = caps[1].len();
            let heading = ATX_CLOSING_HASHES.replace(&caps[2], "");
            push(i + 1, level, heading.trim(), &mut headings);
            i += 1;
            continue;
        }

        if let Some(next) = lines.get(i + 1) {
            let underline = strip_blockquote_prefix(next).trim();
            let level = if is_setext_underline(underline, '=') {
                Some(1)
            } else if is_setext_underline(underline, '-') {
                Some(2)
            } else {
                None
            };
            if let Some(level) = level {
                push(i + 1, level, normalized, &mut headings);
                i += 2;
                continue;
            }
        }

        i += 1;
    }

    headings
}
