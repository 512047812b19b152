//! Post-rename verification of a corpus.
//!
//! Two families of checks, never auto-fixed:
//! - stale tokens: old names, `#old-anchor` fragments and old directory paths
//! - links: relative targets must exist and `#fragment`s must resolve to a
//!   heading in the target document

use glob_match::glob_match;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use super::corpus::Corpus;
use crate::catalog::anchor::is_fence;
use crate::catalog::{extract_headings, MappingTable};
use crate::refactor::{
    anchor_at, cuts_into, ends_anchor, ends_path, find_links, in_malformed_link, is_external,
    is_word_boundary, normalize_path, parent_dir, shielded_anchors, shielded_names, starts_path,
    word_spans,
};

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    StaleName,
    StaleAnchor,
    StalePath,
    MalformedLink,
    BrokenLink,
    DanglingAnchor,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::StaleName => "stale_name",
            ViolationKind::StaleAnchor => "stale_anchor",
            ViolationKind::StalePath => "stale_path",
            ViolationKind::MalformedLink => "malformed_link",
            ViolationKind::BrokenLink => "broken_link",
            ViolationKind::DanglingAnchor => "dangling_anchor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub document: String,
    pub offending_text: String,
    pub location: Location,
    pub kind: ViolationKind,
    pub message: String,
}

/// Checks a corpus against one mapping table.
pub struct Validator<'a> {
    names: Vec<&'a str>,
    anchors: Vec<&'a str>,
    paths: Vec<&'a str>,
    shielded_names: Vec<&'a str>,
    shielded_anchors: Vec<&'a str>,
    exempt: &'a [String],
}

impl<'a> Validator<'a> {
    /// Tokens that are also some record's new text (chained records) are not
    /// treated as stale.
    pub fn new(table: &'a MappingTable, exempt: &'a [String]) -> Self {
        let new_names: HashSet<&str> = table.records.iter().map(|r| r.new_name.as_str()).collect();
        let new_anchors: HashSet<&str> =
            table.records.iter().map(|r| r.new_anchor.as_str()).collect();
        let new_paths: HashSet<&str> =
            table.directories.iter().map(|d| d.new_path.as_str()).collect();

        let names = table
            .records
            .iter()
            .map(|r| r.old_name.as_str())
            .filter(|n| !n.is_empty() && !new_names.contains(n))
            .collect();
        let anchors = table
            .records
            .iter()
            .map(|r| r.old_anchor.as_str())
            .filter(|a| !a.is_empty() && !new_anchors.contains(a))
            .collect();
        let paths = table
            .directories
            .iter()
            .map(|d| d.old_path.as_str())
            .filter(|p| !p.is_empty() && !new_paths.contains(p))
            .collect();

        Validator {
            names,
            anchors,
            paths,
            shielded_names: shielded_names(table),
            shielded_anchors: shielded_anchors(table),
            exempt,
        }
    }

    /// Exempt documents match a glob by full path or by file name.
    pub fn is_exempt(&self, document: &str) -> bool {
        let file_name = document.rsplit('/').next().unwrap_or(document);
        self.exempt
            .iter()
            .any(|pattern| glob_match(pattern, document) || glob_match(pattern, file_name))
    }

    pub fn validate(&self, corpus: &Corpus) -> Vec<Violation> {
        let anchors: BTreeMap<&str, HashSet<String>> = corpus
            .documents()
            .map(|(path, content)| {
                let set = extract_headings(content).into_iter().map(|h| h.anchor).collect();
                (path, set)
            })
            .collect();

        let mut violations = Vec::new();
        for (document, content) in corpus.documents() {
            if self.is_exempt(document) {
                continue;
            }
            self.scan_stale(document, content, &mut violations);
            check_links(document, content, corpus, &anchors, &mut violations);
        }

        violations.sort_by(|a, b| {
            a.document
                .cmp(&b.document)
                .then(a.location.cmp(&b.location))
                .then(a.kind.cmp(&b.kind))
        });
        violations
    }

    fn scan_stale(&self, document: &str, content: &str, out: &mut Vec<Violation>) {
        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let links = find_links(line);
            let shields = word_spans(line, &self.shielded_names);

            for name in &self.names {
                for (start, _) in line.match_indices(*name) {
                    let end = start + name.len();
                    if is_word_boundary(line, start, end) && !cuts_into(&shields, start, end) {
                        out.push(violation(
                            document,
                            name,
                            line,
                            line_no,
                            start,
                            ViolationKind::StaleName,
                            format!("Old name '{}' is still present", name),
                        ));
                    }
                }
            }

            for anchor in &self.anchors {
                let token = format!("#{}", anchor);
                for (start, _) in line.match_indices(&token) {
                    if !ends_anchor(line, start + token.len()) {
                        continue;
                    }
                    let full = anchor_at(line, start + 1);
                    if self.shielded_anchors.iter().any(|a| *a == full) {
                        continue;
                    }
                    let (kind, message) = if in_malformed_link(line, &links, start) {
                        (
                            ViolationKind::MalformedLink,
                            format!("'{}' sits inside a malformed link", token),
                        )
                    } else {
                        (
                            ViolationKind::StaleAnchor,
                            format!("Old anchor '{}' is still referenced", token),
                        )
                    };
                    out.push(violation(document, &token, line, line_no, start, kind, message));
                }
            }

            for path in &self.paths {
                for (start, _) in line.match_indices(*path) {
                    if starts_path(line, start) && ends_path(line, start + path.len()) {
                        out.push(violation(
                            document,
                            path,
                            line,
                            line_no,
                            start,
                            ViolationKind::StalePath,
                            format!("Old directory path '{}' is still referenced", path),
                        ));
                    }
                }
            }
        }
    }
}

fn violation(
    document: &str,
    offending: &str,
    line: &str,
    line_no: usize,
    byte: usize,
    kind: ViolationKind,
    message: String,
) -> Violation {
    Violation {
        document: document.to_string(),
        offending_text: offending.to_string(),
        location: Location {
            line: line_no,
            column: line[..byte].chars().count() + 1,
        },
        kind,
        message,
    }
}

// ============================================================================
// Link checks
// ============================================================================

/// Placeholder and non-file links that are never checked.
fn should_ignore_link(dest: &str) -> bool {
    let lowered = dest.to_lowercase();
    dest.is_empty()
        || dest == "#"
        || is_external(dest)
        || dest.starts_with("//")
        || lowered.starts_with("javascript:")
        || dest.contains("{{")
        || dest.contains("}}")
        || lowered.contains("example.com")
        || lowered.contains("/path/to/")
        || lowered.starts_with("path/to/")
}

fn check_links(
    document: &str,
    content: &str,
    corpus: &Corpus,
    anchors: &BTreeMap<&str, HashSet<String>>,
    out: &mut Vec<Violation>,
) {
    let doc_dir = parent_dir(document);
    let mut in_fence = false;

    for (index, line) in content.lines().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let line_no = index + 1;
        let scan = INLINE_CODE.replace_all(line, |caps: &regex::Captures| " ".repeat(caps[0].len()));

        for link in find_links(&scan) {
            let dest = &scan[link.dest.0..link.dest.1];
            if should_ignore_link(dest) {
                continue;
            }

            let (path, fragment) = match dest.split_once('#') {
                Some((path, fragment)) => (path, Some(percent_decode(fragment))),
                None => (dest, None),
            };
            let path = percent_decode(path.split('?').next().unwrap_or(""));

            let broken = |message: String| {
                violation(document, dest, line, line_no, link.dest.0, ViolationKind::BrokenLink, message)
            };

            let target = if path.is_empty() {
                document.to_string()
            } else {
                let resolved = match path.strip_prefix('/') {
                    Some(rest) => normalize_path("", rest),
                    None => normalize_path(doc_dir, &path),
                };
                let Some(resolved) = resolved else {
                    out.push(broken(format!("Link resolves outside the root: {}", path)));
                    continue;
                };
                if !corpus.exists(&resolved) {
                    out.push(broken(format!("Target not found: {}", path)));
                    continue;
                }
                resolved
            };

            let Some(fragment) = fragment.filter(|f| !f.is_empty()) else {
                continue;
            };

            // directory links resolve anchors against their README
            let target_doc = if corpus.document(&target).is_some() {
                target
            } else {
                let readme = if target.is_empty() {
                    "README.md".to_string()
                } else {
                    format!("{}/README.md", target)
                };
                if corpus.document(&readme).is_none() {
                    continue;
                }
                readme
            };

            let found = anchors
                .get(target_doc.as_str())
                .is_some_and(|set| set.contains(&fragment));
            if !found {
                out.push(violation(
                    document,
                    dest,
                    line,
                    line_no,
                    link.dest.0,
                    ViolationKind::DanglingAnchor,
                    format!("Anchor '#{}' not found in {}", fragment, target_doc),
                ));
            }
        }
    }
}

/// Decode `%XX` escapes; malformed escapes are kept literally.
fn percent_decode(input: &str) -> String {
    let hex = |b: u8| (b as char).to_digit(16).map(|d| d as u8);
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(high * 16 + low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
