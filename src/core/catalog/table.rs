//! Mapping table — the rename records that drive a batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

use super::anchor::heading_anchor;
use super::builtin::{BUILTIN_DIRECTORIES, BUILTIN_RECORDS};
use crate::error::{Error, PreconditionProblem, Result};
use crate::utils::io;

/// Whether a record renames a pattern or an antipattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Pattern,
    Antipattern,
}

/// One name rename: header text, link text and anchor fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RenameRecord {
    pub old_name: String,
    pub new_name: String,
    #[serde(default)]
    pub old_anchor: String,
    #[serde(default)]
    pub new_anchor: String,
    #[serde(default)]
    pub kind: RecordKind,
}

impl RenameRecord {
    /// Build a record whose anchors are derived from the names.
    pub fn new(old_name: &str, new_name: &str, kind: RecordKind) -> Self {
        RenameRecord {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            old_anchor: heading_anchor(old_name),
            new_anchor: heading_anchor(new_name),
            kind,
        }
    }

    pub fn pattern(old_name: &str, new_name: &str) -> Self {
        Self::new(old_name, new_name, RecordKind::Pattern)
    }

    pub fn antipattern(old_name: &str, new_name: &str) -> Self {
        Self::new(old_name, new_name, RecordKind::Antipattern)
    }
}

/// One directory move, both paths relative to the batch root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DirectoryRenameRecord {
    pub old_path: String,
    pub new_path: String,
}

impl DirectoryRenameRecord {
    pub fn new(old_path: &str, new_path: &str) -> Self {
        DirectoryRenameRecord {
            old_path: normalize_relative(old_path),
            new_path: normalize_relative(new_path),
        }
    }
}

/// Strip `./` prefixes and trailing slashes so paths compare component-wise.
pub(crate) fn normalize_relative(path: &str) -> String {
    path.trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

/// The full set of records for one batch. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    #[serde(default)]
    pub records: Vec<RenameRecord>,
    #[serde(default)]
    pub directories: Vec<DirectoryRenameRecord>,
}

/// A record whose new text is, or contains as a whole word, some record's
/// old text.
///
/// Exact chains are allowed (the rewriter applies all records
/// simultaneously) but a second run renames the token again. Contained
/// tokens (`Code Review → AI Code Review`) are left alone wherever the full
/// new name appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainedRecord {
    pub record: String,
    pub feeds_into: String,
    pub token: String,
    pub contained: bool,
}

impl MappingTable {
    /// The table embedded in the binary.
    pub fn builtin() -> Self {
        let records = BUILTIN_RECORDS
            .iter()
            .map(|(old, new, kind)| RenameRecord::new(old, new, *kind))
            .collect();
        let directories = BUILTIN_DIRECTORIES
            .iter()
            .map(|(old, new)| DirectoryRenameRecord::new(old, new))
            .collect();

        MappingTable {
            records,
            directories,
        }
    }

    /// Parse a table from JSON. Records may omit anchors; missing anchors are
    /// derived from the names.
    pub fn from_json(raw: &str, source: &str) -> Result<Self> {
        let mut table: MappingTable =
            serde_json::from_str(raw).map_err(|e| Error::config_invalid_json(source, e))?;

        for record in &mut table.records {
            if record.old_anchor.is_empty() {
                record.old_anchor = heading_anchor(&record.old_name);
            }
            if record.new_anchor.is_empty() {
                record.new_anchor = heading_anchor(&record.new_name);
            }
        }
        for dir in &mut table.directories {
            *dir = DirectoryRenameRecord::new(&dir.old_path, &dir.new_path);
        }

        Ok(table)
    }

    /// Load the override table at `path`, or the builtin table when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = io::read_file(path, &format!("read mapping table {}", path.display()))?;
                Self::from_json(&raw, &path.display().to_string())
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Check the table's own invariants without looking at any file.
    ///
    /// Every problem is collected; the batch is refused if any exist.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::rename_precondition_violation("mapping_table", problems))
        }
    }

    pub fn problems(&self) -> Vec<PreconditionProblem> {
        let mut problems = Vec::new();

        for record in &self.records {
            if record.old_name.trim().is_empty() || record.new_name.trim().is_empty() {
                problems.push(PreconditionProblem {
                    kind: "empty_name".to_string(),
                    subject: format!("{} → {}", record.old_name, record.new_name),
                    message: "Record names cannot be empty".to_string(),
                });
                continue;
            }

            let expected = heading_anchor(&record.new_name);
            if record.new_anchor != expected {
                problems.push(PreconditionProblem {
                    kind: "anchor_mismatch".to_string(),
                    subject: record.new_name.clone(),
                    message: format!(
                        "new_anchor '{}' does not match the anchor '{}' generated from '{}'",
                        record.new_anchor, expected, record.new_name
                    ),
                });
            }
            if record.old_anchor.is_empty() {
                problems.push(PreconditionProblem {
                    kind: "empty_anchor".to_string(),
                    subject: record.old_name.clone(),
                    message: format!("'{}' has no old_anchor", record.old_name),
                });
            }
            if record.old_name == record.new_name && record.old_anchor == record.new_anchor {
                problems.push(PreconditionProblem {
                    kind: "noop_record".to_string(),
                    subject: record.old_name.clone(),
                    message: format!("'{}' renames to itself", record.old_name),
                });
            }
        }

        push_duplicates(
            &mut problems,
            "duplicate_old_name",
            self.records.iter().map(|r| (r.old_name.as_str(), r.new_name.as_str())),
        );
        push_duplicates(
            &mut problems,
            "duplicate_old_anchor",
            self.records.iter().map(|r| (r.old_anchor.as_str(), r.new_name.as_str())),
        );
        push_duplicates(
            &mut problems,
            "duplicate_new_anchor",
            self.records.iter().map(|r| (r.new_anchor.as_str(), r.old_name.as_str())),
        );

        for dir in &self.directories {
            for path in [&dir.old_path, &dir.new_path] {
                if !is_safe_relative(path) {
                    problems.push(PreconditionProblem {
                        kind: "unsafe_path".to_string(),
                        subject: path.clone(),
                        message: format!(
                            "'{}' must be a non-empty path relative to the root without '..'",
                            path
                        ),
                    });
                }
            }
            if dir.old_path == dir.new_path {
                problems.push(PreconditionProblem {
                    kind: "noop_record".to_string(),
                    subject: dir.old_path.clone(),
                    message: format!("'{}' moves to itself", dir.old_path),
                });
            }
        }

        push_duplicates(
            &mut problems,
            "duplicate_old_path",
            self.directories.iter().map(|d| (d.old_path.as_str(), d.new_path.as_str())),
        );

        problems
    }

    /// Records whose replacement text is matched by some record's old text.
    pub fn chained_records(&self) -> Vec<ChainedRecord> {
        let mut chains = Vec::new();
        for record in &self.records {
            for other in &self.records {
                let same = std::ptr::eq(record, other);
                if !same && record.new_anchor == other.old_anchor {
                    chains.push(ChainedRecord {
                        record: record.old_name.clone(),
                        feeds_into: other.old_name.clone(),
                        token: format!("#{}", other.old_anchor),
                        contained: false,
                    });
                } else if !same && record.new_name == other.old_name {
                    chains.push(ChainedRecord {
                        record: record.old_name.clone(),
                        feeds_into: other.old_name.clone(),
                        token: other.old_name.clone(),
                        contained: false,
                    });
                } else if record.new_name != other.old_name
                    && contains_word(&record.new_name, &other.old_name)
                {
                    chains.push(ChainedRecord {
                        record: record.old_name.clone(),
                        feeds_into: other.old_name.clone(),
                        token: other.old_name.clone(),
                        contained: true,
                    });
                }
            }
        }
        chains
    }

    pub fn patterns(&self) -> impl Iterator<Item = &RenameRecord> {
        self.records.iter().filter(|r| r.kind == RecordKind::Pattern)
    }

    pub fn antipatterns(&self) -> impl Iterator<Item = &RenameRecord> {
        self.records.iter().filter(|r| r.kind == RecordKind::Antipattern)
    }
}

fn push_duplicates<'a>(
    problems: &mut Vec<PreconditionProblem>,
    kind: &str,
    keys: impl Iterator<Item = (&'a str, &'a str)>,
) {
    let mut seen: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, owner) in keys {
        seen.entry(key).or_default().push(owner);
    }

    for (key, owners) in seen {
        if owners.len() > 1 {
            problems.push(PreconditionProblem {
                kind: kind.to_string(),
                subject: key.to_string(),
                message: format!("'{}' is used by {} records: {}", key, owners.len(), owners.join(", ")),
            });
        }
    }
}

/// `needle` occurs in `haystack` with no word character on either side.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    !needle.is_empty()
        && haystack.match_indices(needle).any(|(start, _)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + needle.len()..].chars().next();
            !before.is_some_and(is_word) && !after.is_some_and(is_word)
        })
}

fn is_safe_relative(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        let table = MappingTable::builtin();
        assert!(!table.records.is_empty());
        assert!(!table.directories.is_empty());
        table.validate().unwrap();
    }

    #[test]
    fn builtin_table_has_no_chains() {
        assert!(MappingTable::builtin().chained_records().is_empty());
    }

    #[test]
    fn record_derives_anchors() {
        let record = RenameRecord::pattern("Rules as Code", "Codified Rules");
        assert_eq!(record.old_anchor, "rules-as-code");
        assert_eq!(record.new_anchor, "codified-rules");
        assert_eq!(record.kind, RecordKind::Pattern);
    }

    #[test]
    fn duplicate_new_anchor_is_a_precondition_violation() {
        let table = MappingTable {
            records: vec![
                RenameRecord::pattern("AI Security Sandbox", "Security Sandbox"),
                RenameRecord::pattern("Secure AI Sandbox", "Security Sandbox"),
            ],
            directories: vec![],
        };

        let err = table.validate().unwrap_err();
        assert_eq!(err.code.as_str(), "rename.precondition_violation");
        assert_eq!(err.details["stage"], "mapping_table");
        let problems = err.details["problems"].as_array().unwrap();
        assert!(problems
            .iter()
            .any(|p| p["kind"] == "duplicate_new_anchor" && p["subject"] == "security-sandbox"));
    }

    #[test]
    fn declared_anchor_must_match_name() {
        let mut record = RenameRecord::pattern("Rules as Code", "Codified Rules");
        record.new_anchor = "codified".to_string();
        let table = MappingTable {
            records: vec![record],
            directories: vec![],
        };

        let problems = table.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, "anchor_mismatch");
    }

    #[test]
    fn unsafe_directory_paths_are_rejected() {
        let table = MappingTable {
            records: vec![],
            directories: vec![
                DirectoryRenameRecord::new("../outside", "examples/inside"),
                DirectoryRenameRecord::new("/abs", "examples/abs"),
            ],
        };

        let kinds: Vec<String> = table.problems().into_iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec!["unsafe_path", "unsafe_path"]);
    }

    #[test]
    fn chained_records_are_reported() {
        let table = MappingTable {
            records: vec![
                RenameRecord::pattern("Alpha Flow", "Beta Flow"),
                RenameRecord::pattern("Beta Flow", "Gamma Flow"),
            ],
            directories: vec![],
        };

        table.validate().unwrap();
        let chains = table.chained_records();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].record, "Alpha Flow");
        assert_eq!(chains[0].feeds_into, "Beta Flow");
        assert!(!chains[0].contained);
    }

    #[test]
    fn names_containing_an_old_name_are_reported() {
        let table = MappingTable {
            records: vec![
                RenameRecord::pattern("Code Review", "AI Code Review"),
                RenameRecord::pattern("Review Automation", "Automated Reviews"),
            ],
            directories: vec![],
        };

        let chains = table.chained_records();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].record, "Code Review");
        assert_eq!(chains[0].feeds_into, "Code Review");
        assert!(chains[0].contained);

        assert!(contains_word("AI Code Review", "Code Review"));
        assert!(!contains_word("AI Code Reviews", "Code Review"));
    }

    #[test]
    fn json_table_fills_missing_anchors() {
        let raw = r#"{
            "records": [{"old_name": "Rules as Code", "new_name": "Codified Rules", "old_anchor": "", "new_anchor": ""}],
            "directories": [{"old_path": "./examples/rules-as-code/", "new_path": "examples/codified-rules"}]
        }"#;

        let table = MappingTable::from_json(raw, "inline").unwrap();
        assert_eq!(table.records[0].new_anchor, "codified-rules");
        assert_eq!(table.records[0].kind, RecordKind::Pattern);
        assert_eq!(table.directories[0].old_path, "examples/rules-as-code");
    }

    #[test]
    fn json_table_reports_parse_errors() {
        let err = MappingTable::from_json("{ not json", "table.json").unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
        assert_eq!(err.details["path"], "table.json");
    }
}
