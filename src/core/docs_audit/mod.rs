//! Documentation audit for a renamed catalog.
//!
//! This module answers "is the corpus consistent with the mapping table?":
//! 1. Discover the markdown documents in scope
//! 2. Scan them for stale names, anchors and directory paths
//! 3. Check that every link target exists and every fragment resolves
//! 4. Lint the new names against the naming convention

mod corpus;
mod naming;
mod verify;

pub use corpus::{discover_documents, Corpus};
pub use naming::{check_name, lint, LintReport, NameFinding, Severity};
pub use verify::{Location, Validator, Violation, ViolationKind};

use serde::Serialize;
use std::collections::BTreeMap;

/// Documents that legitimately mention the old names (migration guides,
/// the naming convention document).
pub const DEFAULT_EXEMPT: &[&str] = &["PATTERN_MIGRATION_GUIDE.md", "pattern-spec.md"];

/// Violation counts by kind, for summaries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSummary {
    pub docs_scanned: usize,
    pub violations: usize,
    pub by_kind: BTreeMap<String, usize>,
}

impl AuditSummary {
    pub fn from_violations(docs_scanned: usize, violations: &[Violation]) -> Self {
        let mut by_kind = BTreeMap::new();
        for violation in violations {
            *by_kind.entry(violation.kind.as_str().to_string()).or_insert(0) += 1;
        }

        AuditSummary {
            docs_scanned,
            violations: violations.len(),
            by_kind,
        }
    }
}
