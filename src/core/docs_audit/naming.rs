//! Naming-convention lint for pattern and antipattern names.
//!
//! Rules:
//! - exactly two words (a hyphenated compound is one word)
//! - Title Case on every hyphen-separated part
//! - antipatterns open with a negative modifier
//! - generic words are allowed but warned about

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::corpus::Corpus;
use crate::catalog::anchor::is_fence;
use crate::catalog::{MappingTable, RecordKind};

/// Prefixes (matched against the first word, hyphens removed) that mark an
/// antipattern name as negative.
const NEGATIVE_PREFIXES: &[&str] = &[
    "broken", "blind", "over", "under", "false", "un", "premature", "reckless", "static",
    "manual", "scattered", "chaotic", "unsafe", "reactive", "confused", "ignored", "wasteful",
    "overwhelming", "unchecked", "redundant", "shallow", "hardcoded", "contextless",
    "unprotected", "overlapping", "unplanned", "isolated", "monolithic", "bloated",
    "unconstrained", "constraint", "delayed", "undocumented", "random", "unrestricted",
];

const GENERIC_WORDS: &[&str] = &[
    "ai", "pattern", "helper", "utility", "common", "general", "manager", "handler", "service",
];

static ANTIPATTERN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*###\s*Anti-Pattern:\s*(.+?)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameFinding {
    pub name: String,
    pub kind: RecordKind,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// `table`, or the document the name was found in.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub names_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub findings: Vec<NameFinding>,
}

impl LintReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    /// Drops warning findings and the warning count with them.
    pub fn retain_errors(&mut self) {
        self.findings.retain(|f| f.severity == Severity::Error);
        self.warnings = 0;
    }
}

fn is_title_case(name: &str) -> bool {
    name.split_whitespace()
        .flat_map(|word| word.split('-'))
        .all(|part| part.chars().next().map_or(true, |c| c.is_uppercase()))
}

fn has_negative_indicator(name: &str) -> bool {
    let Some(first) = name.split_whitespace().next() else {
        return false;
    };
    let first = first.to_lowercase().replace('-', "");
    NEGATIVE_PREFIXES.iter().any(|prefix| first.starts_with(prefix))
}

fn generic_words(name: &str) -> Vec<String> {
    name.split_whitespace()
        .map(|w| w.to_lowercase().replace('-', ""))
        .filter(|w| GENERIC_WORDS.contains(&w.as_str()))
        .collect()
}

/// `(rule, severity, message)` for every rule `name` breaks.
pub fn check_name(name: &str, kind: RecordKind) -> Vec<(&'static str, Severity, String)> {
    let mut broken = Vec::new();

    let words = name.split_whitespace().count();
    if words != 2 {
        broken.push((
            "word_count",
            Severity::Error,
            format!(
                "Must be exactly 2 words (found {}); hyphenated compounds count as one",
                words
            ),
        ));
    }

    if !is_title_case(name) {
        broken.push((
            "title_case",
            Severity::Error,
            "Every word must be capitalized".to_string(),
        ));
    }

    match kind {
        RecordKind::Antipattern => {
            if !has_negative_indicator(name) {
                broken.push((
                    "negative_indicator",
                    Severity::Error,
                    "Antipatterns must open with a negative modifier (Broken, Blind, Over-, Under-, Un-, ...)"
                        .to_string(),
                ));
            }
        }
        RecordKind::Pattern => {
            let generic = generic_words(name);
            if !generic.is_empty() {
                broken.push((
                    "generic_word",
                    Severity::Warning,
                    format!("Contains generic words: {}", generic.join(", ")),
                ));
            }
        }
    }

    broken
}

fn findings_for(name: &str, kind: RecordKind, source: &str, line: Option<usize>) -> Vec<NameFinding> {
    check_name(name, kind)
        .into_iter()
        .map(|(rule, severity, message)| NameFinding {
            name: name.to_string(),
            kind,
            rule: rule.to_string(),
            severity,
            message,
            source: source.to_string(),
            line,
        })
        .collect()
}

/// Lint every `new_name` in the table and every `### Anti-Pattern:` heading
/// in the non-exempt documents.
pub fn lint<F>(table: &MappingTable, corpus: &Corpus, is_exempt: F) -> LintReport
where
    F: Fn(&str) -> bool,
{
    let mut findings = Vec::new();
    let mut names_checked = 0;

    for record in &table.records {
        names_checked += 1;
        findings.extend(findings_for(&record.new_name, record.kind, "table", None));
    }

    for (document, content) in corpus.documents() {
        if is_exempt(document) {
            continue;
        }
        let mut in_fence = false;
        for (index, line) in content.lines().enumerate() {
            if is_fence(line) {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            if let Some(caps) = ANTIPATTERN_HEADING.captures(line) {
                names_checked += 1;
                findings.extend(findings_for(
                    &caps[1],
                    RecordKind::Antipattern,
                    document,
                    Some(index + 1),
                ));
            }
        }
    }

    let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
    LintReport {
        names_checked,
        errors,
        warnings: findings.len() - errors,
        findings,
    }
}
