//! Text rewriter — apply the whole mapping table to one document.
//!
//! Every record is applied in a single combined pass per line:
//! 1. Well-formed links: anchor fragments and destinations into moved directories
//! 2. Names anywhere in the line (headers, link texts, tables, diagrams)
//! 3. Bare `#anchor` tokens outside links
//! 4. Root-relative directory paths outside links
//!
//! Matches are claimed longest-first and never overlap, then spliced from the
//! end of the line backwards so earlier offsets stay valid. Replacement text is
//! never rescanned, which is what makes chained records safe.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::paths::{execution_order, map_under};
use crate::catalog::anchor::is_fence;
use crate::catalog::{contains_word, DirectoryRenameRecord, MappingTable};

/// `[text](dest)` or `![alt](dest)`, optionally with a quoted title.
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!?\[([^\[\]\n]*)\]\(([^()\s]*)(?:\s+"[^"]*")?\)"#).unwrap()
});

static ATX_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(?:>\s*)*#{1,6}\s").unwrap());

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementKind {
    Header,
    LinkText,
    Text,
    Anchor,
    Path,
}

/// One applied substitution, located in the document before rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub line: usize,
    pub column: usize,
    pub kind: ReplacementKind,
    pub from: String,
    pub to: String,
}

/// A token that looked like a rename target but was left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteWarning {
    pub line: usize,
    pub column: usize,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub content: String,
    pub replacements: Vec<Replacement>,
    pub warnings: Vec<RewriteWarning>,
}

impl RewriteOutcome {
    pub fn changed(&self) -> bool {
        !self.replacements.is_empty()
    }
}

struct Edit {
    start: usize,
    end: usize,
    text: String,
    kind: ReplacementKind,
}

/// Non-overlapping edits for one line.
#[derive(Default)]
struct LineEdits {
    edits: Vec<Edit>,
}

impl LineEdits {
    fn is_free(&self, start: usize, end: usize) -> bool {
        self.edits.iter().all(|e| end <= e.start || start >= e.end)
    }

    fn claim(&mut self, start: usize, end: usize, text: String, kind: ReplacementKind) -> bool {
        if !self.is_free(start, end) {
            return false;
        }
        self.edits.push(Edit {
            start,
            end,
            text,
            kind,
        });
        true
    }
}

/// Byte spans of a well-formed link within one line.
pub(crate) struct Link {
    pub start: usize,
    pub end: usize,
    pub text: (usize, usize),
    pub dest: (usize, usize),
}

// ============================================================================
// Rewriter
// ============================================================================

/// The mapping table prepared for matching: names and anchors sorted
/// longest-first, directory moves in execution order.
pub struct TextRewriter<'a> {
    names: Vec<(&'a str, &'a str)>,
    anchors: Vec<(&'a str, &'a str)>,
    shielded_names: Vec<&'a str>,
    shielded_anchors: Vec<&'a str>,
    moves: Vec<&'a DirectoryRenameRecord>,
    sources: Vec<&'a DirectoryRenameRecord>,
}

impl<'a> TextRewriter<'a> {
    pub fn new(table: &'a MappingTable) -> Self {
        let mut names: Vec<(&str, &str)> = table
            .records
            .iter()
            .filter(|r| !r.old_name.is_empty())
            .map(|r| (r.old_name.as_str(), r.new_name.as_str()))
            .collect();
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

        let mut anchors: Vec<(&str, &str)> = table
            .records
            .iter()
            .filter(|r| !r.old_anchor.is_empty())
            .map(|r| (r.old_anchor.as_str(), r.new_anchor.as_str()))
            .collect();
        anchors.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

        let (order, cyclic) = execution_order(&table.directories);
        let moves = order
            .into_iter()
            .chain(cyclic)
            .map(|i| &table.directories[i])
            .collect();

        let mut sources: Vec<&DirectoryRenameRecord> = table.directories.iter().collect();
        sources.sort_by(|a, b| {
            b.old_path
                .len()
                .cmp(&a.old_path.len())
                .then(a.old_path.cmp(&b.old_path))
        });

        TextRewriter {
            names,
            anchors,
            shielded_names: shielded_names(table),
            shielded_anchors: shielded_anchors(table),
            moves,
            sources,
        }
    }

    /// Where a root-relative path ends up once every move has run, or `None`
    /// if no move touches it.
    pub fn map_path(&self, path: &str) -> Option<String> {
        let mut current = path.to_string();
        let mut changed = false;
        for record in &self.moves {
            if let Some(mapped) = map_under(&current, &record.old_path, &record.new_path) {
                current = mapped;
                changed = true;
            }
        }
        changed.then_some(current)
    }

    /// Rewrite `content`, the document at root-relative path `document`.
    ///
    /// Pure: nothing is read or written. Line endings are preserved.
    pub fn rewrite(&self, document: &str, content: &str) -> RewriteOutcome {
        let doc_dir = parent_dir(document);
        let target_dir = self.map_path(doc_dir).unwrap_or_else(|| doc_dir.to_string());

        let mut outcome = RewriteOutcome {
            content: String::with_capacity(content.len()),
            ..Default::default()
        };
        let mut in_fence = false;

        for (index, raw) in content.split_inclusive('\n').enumerate() {
            let (body, ending) = split_line_ending(raw);
            let line_no = index + 1;

            let fence = is_fence(body);
            let is_header = !in_fence && !fence && ATX_HEADER.is_match(body);
            if fence {
                in_fence = !in_fence;
            }

            let links = find_links(body);
            let mut edits = LineEdits::default();

            for link in &links {
                self.rewrite_destination(body, link, doc_dir, &target_dir, &mut edits);
            }
            self.rewrite_names(body, &links, is_header, &mut edits);
            self.rewrite_bare_anchors(body, &links, line_no, &mut edits, &mut outcome.warnings);
            self.rewrite_bare_paths(body, &links, &mut edits);

            let mut line = body.to_string();
            edits.edits.sort_by(|a, b| b.start.cmp(&a.start));
            for edit in &edits.edits {
                outcome.replacements.push(Replacement {
                    line: line_no,
                    column: column_of(body, edit.start),
                    kind: edit.kind,
                    from: body[edit.start..edit.end].to_string(),
                    to: edit.text.clone(),
                });
                line.replace_range(edit.start..edit.end, &edit.text);
            }

            outcome.content.push_str(&line);
            outcome.content.push_str(ending);
        }

        outcome
            .replacements
            .sort_by(|a, b| a.line.cmp(&b.line).then(a.column.cmp(&b.column)));
        outcome
    }

    fn rewrite_destination(
        &self,
        body: &str,
        link: &Link,
        doc_dir: &str,
        target_dir: &str,
        edits: &mut LineEdits,
    ) {
        let (dest_start, dest_end) = link.dest;
        let dest = &body[dest_start..dest_end];
        let (path, fragment) = match dest.find('#') {
            Some(hash) => (&dest[..hash], Some((dest_start + hash + 1, dest_end))),
            None => (dest, None),
        };

        if let Some((frag_start, frag_end)) = fragment {
            let frag = &body[frag_start..frag_end];
            if let Some((old, new)) = self.match_anchor(frag) {
                edits.claim(frag_start, frag_start + old.len(), new.to_string(), ReplacementKind::Anchor);
            }
        }

        if let Some(new_path) = self.relink(path, doc_dir, target_dir) {
            edits.claim(dest_start, dest_start + path.len(), new_path, ReplacementKind::Path);
        }
    }

    /// New destination for a link whose target moves, relative to where the
    /// linking document will live.
    fn relink(&self, path: &str, doc_dir: &str, target_dir: &str) -> Option<String> {
        if path.is_empty() || is_external(path) {
            return None;
        }

        let (absolute, resolved) = match path.strip_prefix('/') {
            Some(rest) => (true, normalize_path("", rest)?),
            None => (false, normalize_path(doc_dir, path)?),
        };
        let mapped = self.map_path(&resolved)?;

        let mut new_path = if absolute {
            format!("/{}", mapped)
        } else {
            let relative = relative_path(target_dir, &mapped);
            if path.starts_with("./") && !relative.starts_with("../") && relative != "." {
                format!("./{}", relative)
            } else {
                relative
            }
        };
        if path.ends_with('/') && !new_path.ends_with('/') {
            new_path.push('/');
        }

        (new_path != path).then_some(new_path)
    }

    fn rewrite_names(&self, body: &str, links: &[Link], is_header: bool, edits: &mut LineEdits) {
        let shields = word_spans(body, &self.shielded_names);
        for (old, new) in &self.names {
            for (start, _) in body.match_indices(old) {
                let end = start + old.len();
                if !is_word_boundary(body, start, end)
                    || in_destination(links, start, end)
                    || cuts_into(&shields, start, end)
                {
                    continue;
                }
                let kind = if is_header {
                    ReplacementKind::Header
                } else if links.iter().any(|l| start >= l.text.0 && end <= l.text.1) {
                    ReplacementKind::LinkText
                } else {
                    ReplacementKind::Text
                };
                edits.claim(start, end, new.to_string(), kind);
            }
        }
    }

    fn rewrite_bare_anchors(
        &self,
        body: &str,
        links: &[Link],
        line_no: usize,
        edits: &mut LineEdits,
        warnings: &mut Vec<RewriteWarning>,
    ) {
        for (old, new) in &self.anchors {
            let token = format!("#{}", old);
            for (start, _) in body.match_indices(&token) {
                let anchor_start = start + 1;
                let anchor_end = anchor_start + old.len();
                if !ends_anchor(body, anchor_end) || in_link(links, start) {
                    continue;
                }
                let token_text = anchor_at(body, anchor_start);
                if self.shielded_anchors.iter().any(|a| *a == token_text) {
                    continue;
                }
                if !edits.is_free(anchor_start, anchor_end) {
                    continue;
                }
                if in_malformed_link(body, links, start) {
                    warnings.push(RewriteWarning {
                        line: line_no,
                        column: column_of(body, start),
                        token: token.clone(),
                        message: format!("'{}' sits inside a malformed link; left unchanged", token),
                    });
                    continue;
                }
                edits.claim(anchor_start, anchor_end, new.to_string(), ReplacementKind::Anchor);
            }
        }
    }

    fn rewrite_bare_paths(&self, body: &str, links: &[Link], edits: &mut LineEdits) {
        for record in &self.sources {
            for (start, _) in body.match_indices(record.old_path.as_str()) {
                let end = start + record.old_path.len();
                if !starts_path(body, start) || !ends_path(body, end) || in_destination(links, start, end) {
                    continue;
                }
                if let Some(mapped) = self.map_path(&record.old_path) {
                    edits.claim(start, end, mapped, ReplacementKind::Path);
                }
            }
        }
    }

    /// Longest old anchor that the fragment is, allowing a `-N` duplicate suffix.
    fn match_anchor(&self, fragment: &str) -> Option<(&'a str, &'a str)> {
        if self.shielded_anchors.iter().any(|a| *a == fragment) {
            return None;
        }
        self.anchors.iter().copied().find(|(old, _)| {
            fragment
                .strip_prefix(*old)
                .is_some_and(|rest| rest.is_empty() || is_duplicate_suffix(rest))
        })
    }
}

// ============================================================================
// Shielded new text
// ============================================================================

/// New names that contain some old name as a whole word without being an
/// old name themselves. The old name inside them is already renamed.
pub(crate) fn shielded_names(table: &MappingTable) -> Vec<&str> {
    let mut shielded: Vec<&str> = table
        .records
        .iter()
        .map(|r| r.new_name.as_str())
        .filter(|new| {
            !table.records.iter().any(|r| r.old_name == *new)
                && table.records.iter().any(|r| contains_word(new, &r.old_name))
        })
        .collect();
    shielded.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    shielded.dedup();
    shielded
}

/// New anchors that are not also an old anchor.
pub(crate) fn shielded_anchors(table: &MappingTable) -> Vec<&str> {
    let mut shielded: Vec<&str> = table
        .records
        .iter()
        .map(|r| r.new_anchor.as_str())
        .filter(|new| !new.is_empty() && !table.records.iter().any(|r| r.old_anchor == *new))
        .collect();
    shielded.sort_unstable();
    shielded.dedup();
    shielded
}

/// Byte spans of whole-word occurrences of `words`.
pub(crate) fn word_spans(body: &str, words: &[&str]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    for word in words {
        for (start, _) in body.match_indices(word) {
            let end = start + word.len();
            if is_word_boundary(body, start, end) {
                spans.push((start, end));
            }
        }
    }
    spans
}

/// `start..end` overlaps a shielded span without covering all of it.
pub(crate) fn cuts_into(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans
        .iter()
        .any(|&(s, e)| start < e && end > s && !(start <= s && end >= e))
}

/// The full anchor token starting at `start`.
pub(crate) fn anchor_at(body: &str, start: usize) -> &str {
    let rest = &body[start..];
    let len = rest.find(|c: char| !is_anchor_char(c)).unwrap_or(rest.len());
    &rest[..len]
}

// ============================================================================
// Line scanning helpers
// ============================================================================

pub(crate) fn find_links(body: &str) -> Vec<Link> {
    MARKDOWN_LINK
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let text = caps.get(1)?;
            let dest = caps.get(2)?;
            Some(Link {
                start: whole.start(),
                end: whole.end(),
                text: (text.start(), text.end()),
                dest: (dest.start(), dest.end()),
            })
        })
        .collect()
}

fn in_link(links: &[Link], pos: usize) -> bool {
    links.iter().any(|l| pos >= l.start && pos < l.end)
}

fn in_destination(links: &[Link], start: usize, end: usize) -> bool {
    links.iter().any(|l| start < l.dest.1 && end > l.dest.0)
}

/// An opening `(` left unclosed after a stray bracket, with no well-formed
/// link in between: `[Name(#anchor)`, `[Name]](#anchor)`, `[Name](#anchor`.
pub(crate) fn in_malformed_link(body: &str, links: &[Link], pos: usize) -> bool {
    if in_link(links, pos) {
        return false;
    }
    let segment_start = links
        .iter()
        .filter(|l| l.end <= pos)
        .map(|l| l.end)
        .max()
        .unwrap_or(0);
    let segment = &body[segment_start..pos];

    match segment.rfind('(') {
        Some(open) => !segment[open..].contains(')') && segment[..open].contains(['[', ']']),
        None => false,
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn is_word_boundary(body: &str, start: usize, end: usize) -> bool {
    let before = body[..start].chars().next_back();
    let after = body[end..].chars().next();
    !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
}

fn is_anchor_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_duplicate_suffix(rest: &str) -> bool {
    rest.strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// The anchor ends here, or continues only with a `-N` duplicate suffix.
pub(crate) fn ends_anchor(body: &str, end: usize) -> bool {
    let rest = &body[end..];
    let tail_len = rest.find(|c: char| !is_anchor_char(c)).unwrap_or(rest.len());
    let tail = &rest[..tail_len];
    tail.is_empty() || is_duplicate_suffix(tail)
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')
}

/// A root-relative path may start after a non-path char, or after a bare
/// `/` or `./` that itself follows one.
pub(crate) fn starts_path(body: &str, start: usize) -> bool {
    let before = &body[..start];
    let prefix = before
        .strip_suffix("./")
        .or_else(|| before.strip_suffix('/'))
        .unwrap_or(before);
    if prefix.len() == before.len() {
        return !before.chars().next_back().is_some_and(is_path_char);
    }
    !prefix.chars().next_back().is_some_and(is_path_char)
}

pub(crate) fn ends_path(body: &str, end: usize) -> bool {
    let mut rest = body[end..].chars();
    match rest.next() {
        None | Some('/') => true,
        Some('.') => !rest.next().is_some_and(|c| c.is_alphanumeric()),
        Some(c) => !(c.is_alphanumeric() || c == '_' || c == '-'),
    }
}

fn column_of(body: &str, byte: usize) -> usize {
    body[..byte].chars().count() + 1
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

// ============================================================================
// Path helpers
// ============================================================================

pub(crate) fn is_external(dest: &str) -> bool {
    dest.contains("://") || dest.starts_with("mailto:") || dest.starts_with("tel:")
}

/// Directory part of a root-relative document path (`""` at the root).
pub(crate) fn parent_dir(document: &str) -> &str {
    document.rfind('/').map(|i| &document[..i]).unwrap_or("")
}

/// Join `path` onto `base` lexically. `None` if it climbs above the root.
pub(crate) fn normalize_path(base: &str, path: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Relative path from directory `from` to `to`, both root-relative.
pub(crate) fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<&str> = from.split('/').filter(|p| !p.is_empty()).collect();
    let to: Vec<&str> = to.split('/').filter(|p| !p.is_empty()).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(&to[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DirectoryRenameRecord, RenameRecord};

    fn table() -> MappingTable {
        MappingTable {
            records: vec![
                RenameRecord::pattern("Rules as Code", "Codified Rules"),
                RenameRecord::pattern("AI Security Sandbox", "Security Sandbox"),
                RenameRecord::antipattern("Blind AI Trust", "Blind Trust"),
            ],
            directories: vec![
                DirectoryRenameRecord::new("examples/rules-as-code", "examples/codified-rules"),
                DirectoryRenameRecord::new("examples/ai-security-sandbox", "examples/security-sandbox"),
            ],
        }
    }

    fn rewrite(document: &str, content: &str) -> RewriteOutcome {
        let table = table();
        TextRewriter::new(&table).rewrite(document, content)
    }

    #[test]
    fn renames_header_link_and_anchor() {
        let out = rewrite(
            "README.md",
            "## Rules as Code\n\nSee [Rules as Code](#rules-as-code).\n",
        );
        assert_eq!(
            out.content,
            "## Codified Rules\n\nSee [Codified Rules](#codified-rules).\n"
        );

        let kinds: Vec<ReplacementKind> = out.replacements.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![ReplacementKind::Header, ReplacementKind::LinkText, ReplacementKind::Anchor]
        );
        assert_eq!(out.replacements[0].line, 1);
        assert_eq!(out.replacements[0].column, 4);
    }

    #[test]
    fn rewriting_twice_changes_nothing() {
        let content = "# Catalog\n\
            | [AI Security Sandbox](#ai-security-sandbox) | Beta |\n\
            ### Anti-Pattern: Blind AI Trust\n\
            Jump to #rules-as-code or [setup](examples/rules-as-code/README.md).\n";
        let first = rewrite("README.md", content);
        let second = rewrite("README.md", &first.content);

        assert!(first.changed());
        assert_eq!(second.content, first.content);
        assert!(second.replacements.is_empty());
    }

    #[test]
    fn chained_records_apply_simultaneously() {
        let table = MappingTable {
            records: vec![
                RenameRecord::pattern("Alpha Flow", "Beta Flow"),
                RenameRecord::pattern("Beta Flow", "Gamma Flow"),
            ],
            directories: vec![],
        };
        let out = TextRewriter::new(&table).rewrite(
            "README.md",
            "## Alpha Flow\n## Beta Flow\n[x](#alpha-flow) [y](#beta-flow)\n",
        );
        assert_eq!(
            out.content,
            "## Beta Flow\n## Gamma Flow\n[x](#beta-flow) [y](#gamma-flow)\n"
        );
    }

    #[test]
    fn longest_name_wins() {
        let table = MappingTable {
            records: vec![
                RenameRecord::pattern("Code Review", "Peer Review"),
                RenameRecord::pattern("AI Code Review", "Automated Review"),
            ],
            directories: vec![],
        };
        let out = TextRewriter::new(&table).rewrite("a.md", "AI Code Review beats Code Review\n");
        assert_eq!(out.content, "Automated Review beats Peer Review\n");
    }

    #[test]
    fn names_respect_word_boundaries() {
        let out = rewrite("a.md", "Rules as Codes and Rules as Code.\n");
        assert_eq!(out.content, "Rules as Codes and Codified Rules.\n");
    }

    #[test]
    fn malformed_link_anchor_is_left_with_warning() {
        let out = rewrite("a.md", "[Rules as Code(#rules-as-code)\n");
        assert!(out.content.contains("(#rules-as-code)"));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].token, "#rules-as-code");
        assert_eq!(out.warnings[0].column, 16);
    }

    #[test]
    fn prose_parentheses_are_not_malformed() {
        let out = rewrite("a.md", "(see #rules-as-code for details)\n");
        assert_eq!(out.content, "(see #codified-rules for details)\n");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn anchor_keeps_duplicate_suffix_and_ignores_longer_anchors() {
        let out = rewrite(
            "a.md",
            "[a](#rules-as-code-1) #rules-as-code-2 #rules-as-code-extended\n",
        );
        assert_eq!(
            out.content,
            "[a](#codified-rules-1) #codified-rules-2 #rules-as-code-extended\n"
        );
    }

    #[test]
    fn diagram_click_urls_are_rewritten() {
        let content = "```mermaid\nclick RC \"https://example.com/README.md#rules-as-code\"\nRC[Rules as Code]\n```\n";
        let out = rewrite("README.md", content);
        assert!(out.content.contains("README.md#codified-rules\""));
        assert!(out.content.contains("RC[Codified Rules]"));
        assert!(out.replacements.iter().all(|r| r.kind != ReplacementKind::Header));
    }

    #[test]
    fn root_relative_paths_in_text_and_links() {
        let content = "Run `examples/rules-as-code/check.sh` or open [it](examples/rules-as-code/).\n\
            Not other/examples/rules-as-code or examples/rules-as-code-v2.\n";
        let out = rewrite("README.md", content);
        assert_eq!(
            out.content,
            "Run `examples/codified-rules/check.sh` or open [it](examples/codified-rules/).\n\
            Not other/examples/rules-as-code or examples/rules-as-code-v2.\n"
        );
    }

    #[test]
    fn relative_links_follow_both_ends_of_a_move() {
        let content = "[rules](../rules-as-code/README.md)\n\
            [setup](./docs/setup.md)\n\
            [home](../../README.md#rules-as-code)\n";
        let out = rewrite("examples/ai-security-sandbox/README.md", content);
        assert_eq!(
            out.content,
            "[rules](../codified-rules/README.md)\n\
            [setup](./docs/setup.md)\n\
            [home](../../README.md#codified-rules)\n"
        );
    }

    #[test]
    fn repo_absolute_link_is_mapped() {
        let out = rewrite("docs/guide.md", "[x](/examples/rules-as-code/README.md)\n");
        assert_eq!(out.content, "[x](/examples/codified-rules/README.md)\n");
    }

    #[test]
    fn external_links_are_not_relinked() {
        let content = "[x](https://github.com/org/repo/tree/main/examples/rules-as-code)\n";
        let out = rewrite("README.md", content);
        assert_eq!(out.content, content);
    }

    #[test]
    fn crlf_line_endings_are_preserved() {
        let out = rewrite("a.md", "## Rules as Code\r\nbody\r\n");
        assert_eq!(out.content, "## Codified Rules\r\nbody\r\n");
    }

    #[test]
    fn path_helpers() {
        assert_eq!(normalize_path("examples/a", "../b/README.md").as_deref(), Some("examples/b/README.md"));
        assert_eq!(normalize_path("", "../escape"), None);
        assert_eq!(relative_path("examples/a", "examples/b/README.md"), "../b/README.md");
        assert_eq!(relative_path("", "examples/b"), "examples/b");
        assert_eq!(relative_path("examples/b", "examples/b"), ".");
        assert_eq!(parent_dir("README.md"), "");
        assert_eq!(parent_dir("examples/a/README.md"), "examples/a");
    }

    #[test]
    fn new_name_containing_its_old_name_is_stable() {
        let table = MappingTable {
            records: vec![RenameRecord::pattern("Code Review", "AI Code Review")],
            directories: vec![],
        };
        let rewriter = TextRewriter::new(&table);

        let once = rewriter.rewrite(
            "README.md",
            "## Code Review\n[Code Review](#code-review) and #code-review\n",
        );
        assert_eq!(
            once.content,
            "## AI Code Review\n[AI Code Review](#ai-code-review) and #ai-code-review\n"
        );

        let twice = rewriter.rewrite("README.md", &once.content);
        assert!(!twice.changed(), "{:?}", twice.replacements);
        assert_eq!(twice.content, once.content);
    }
}
