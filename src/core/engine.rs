//! Batch engine — one rename run from loaded table to validated tree.
//!
//! `Loaded → Rewritten → Validated`, or `Failed` when violations remain;
//! the report carries the state the run ended in.
//! Every precondition (table invariants, move plan) is checked before the
//! first byte is written; a precondition error leaves the tree untouched.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::{ChainedRecord, MappingTable};
use crate::docs_audit::{
    self, discover_documents, AuditSummary, Corpus, LintReport, Validator, Violation,
};
use crate::error::Result;
use crate::refactor::{
    apply_moves, plan_moves, select_backend, MoveOutcome, MovePlan, MoveStatus, Replacement,
    RewriteWarning, TextRewriter,
};
use crate::utils::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Loaded,
    Rewritten,
    Validated,
    Failed,
}

impl BatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchState::Loaded => "loaded",
            BatchState::Rewritten => "rewritten",
            BatchState::Validated => "validated",
            BatchState::Failed => "failed",
        }
    }

    fn advance(self, next: BatchState) -> BatchState {
        crate::log_status!("rename", "{} → {}", self.as_str(), next.as_str());
        next
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub root: PathBuf,
    /// Compute everything and validate the projected tree; write nothing.
    pub dry_run: bool,
    /// Use git for discovery and moves when the root is a work tree.
    pub use_git: bool,
    /// Globs of documents that are neither rewritten nor validated.
    pub exempt: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentChange {
    pub document: String,
    pub replacements: Vec<Replacement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RewriteWarning>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub documents_scanned: usize,
    pub documents_rewritten: usize,
    pub replacements: usize,
    pub directories_moved: usize,
    pub directories_already_applied: usize,
    pub warnings: usize,
    pub violations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub state: BatchState,
    pub dry_run: bool,
    pub summary: BatchSummary,
    pub documents: Vec<DocumentChange>,
    pub moves: Vec<MoveOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chained: Vec<ChainedRecord>,
    pub violations: Vec<Violation>,
}

impl BatchReport {
    pub fn passed(&self) -> bool {
        self.state == BatchState::Validated
    }
}

/// Run the whole batch.
pub fn run(table: &MappingTable, options: &BatchOptions) -> Result<BatchReport> {
    table.validate()?;

    let chained = table.chained_records();
    for chain in chained.iter().filter(|c| !c.contained) {
        crate::log_status!(
            "rename",
            "warning: '{}' produces {} which '{}' also renames; a second run would rename it again",
            chain.record,
            chain.token,
            chain.feeds_into
        );
    }
    for chain in chained.iter().filter(|c| c.contained) {
        crate::log_status!(
            "rename",
            "note: '{}' produces a name containing '{}'; it is not renamed inside the new name",
            chain.record,
            chain.token
        );
    }

    let root = &options.root;
    let documents = discover_documents(root, options.use_git)?;
    let corpus = Corpus::load(root, &documents)?;
    let documents_scanned = corpus.len();
    let plan = plan_moves(&table.directories, root)?;

    crate::log_status!(
        "rename",
        "Loaded {} records, {} directory moves, {} documents{}",
        table.records.len(),
        table.directories.len(),
        documents_scanned,
        if options.dry_run { " (dry run)" } else { "" }
    );

    let state = BatchState::Loaded;

    let validator = Validator::new(table, &options.exempt);
    let (changes, rewritten) = rewrite_corpus(table, &corpus, &validator);
    let documents_rewritten = rewritten.len();

    if !options.dry_run {
        for (document, content) in &rewritten {
            io::write_file_atomic(&root.join(document), content, &format!("write {}", document))?;
        }
    }
    for change in &changes {
        crate::log_status!(
            "rename",
            "{} {} ({} replacements)",
            if options.dry_run { "would rewrite" } else { "rewrote" },
            change.document,
            change.replacements.len()
        );
    }

    let moves = if options.dry_run {
        planned_outcomes(&plan)
    } else {
        let backend = select_backend(root, options.use_git);
        apply_moves(&plan, root, backend.as_ref())?
    };
    let state = state.advance(BatchState::Rewritten);

    let post = if options.dry_run {
        corpus.with_contents(rewritten).relocated(&plan)
    } else {
        let documents = discover_documents(root, options.use_git)?;
        Corpus::load(root, &documents)?
    };
    let violations = validator.validate(&post);
    log_violations(&violations);

    let state = state.advance(if violations.is_empty() {
        BatchState::Validated
    } else {
        BatchState::Failed
    });

    let summary = BatchSummary {
        documents_scanned,
        documents_rewritten,
        replacements: changes.iter().map(|c| c.replacements.len()).sum(),
        directories_moved: moves
            .iter()
            .filter(|m| m.status == MoveStatus::Pending)
            .count(),
        directories_already_applied: moves
            .iter()
            .filter(|m| m.status == MoveStatus::AlreadyApplied)
            .count(),
        warnings: changes.iter().map(|c| c.warnings.len()).sum(),
        violations: violations.len(),
    };

    crate::log_status!(
        "rename",
        "{} documents rewritten, {} replacements, {} directories moved, {} violations",
        summary.documents_rewritten,
        summary.replacements,
        summary.directories_moved,
        summary.violations
    );

    Ok(BatchReport {
        state,
        dry_run: options.dry_run,
        summary,
        documents: changes,
        moves,
        chained,
        violations,
    })
}

/// Rewrite every non-exempt document in memory.
fn rewrite_corpus(
    table: &MappingTable,
    corpus: &Corpus,
    validator: &Validator,
) -> (Vec<DocumentChange>, BTreeMap<String, String>) {
    let rewriter = TextRewriter::new(table);
    let mut changes = Vec::new();
    let mut rewritten = BTreeMap::new();

    for (document, content) in corpus.documents() {
        if validator.is_exempt(document) {
            continue;
        }

        let outcome = rewriter.rewrite(document, content);
        for warning in &outcome.warnings {
            crate::log_status!(
                "rename",
                "warning: {}:{}:{}: {}",
                document,
                warning.line,
                warning.column,
                warning.message
            );
        }

        if outcome.changed() || !outcome.warnings.is_empty() {
            if outcome.changed() {
                rewritten.insert(document.to_string(), outcome.content);
            }
            changes.push(DocumentChange {
                document: document.to_string(),
                replacements: outcome.replacements,
                warnings: outcome.warnings,
            });
        }
    }

    (changes, rewritten)
}

fn planned_outcomes(plan: &MovePlan) -> Vec<MoveOutcome> {
    plan.moves
        .iter()
        .map(|m| MoveOutcome {
            from: m.old_path.clone(),
            to: m.new_path.clone(),
            status: m.status,
            backend: None,
        })
        .collect()
}

/// Validate the tree as it is, without rewriting anything.
pub fn check(table: &MappingTable, options: &BatchOptions) -> Result<(AuditSummary, Vec<Violation>)> {
    table.validate()?;

    let documents = discover_documents(&options.root, options.use_git)?;
    let corpus = Corpus::load(&options.root, &documents)?;
    let violations = Validator::new(table, &options.exempt).validate(&corpus);
    log_violations(&violations);

    let summary = AuditSummary::from_violations(corpus.len(), &violations);
    crate::log_status!(
        "check",
        "{} documents scanned, {} violations",
        summary.docs_scanned,
        summary.violations
    );

    Ok((summary, violations))
}

/// Lint the table's new names and the corpus's antipattern headings.
pub fn lint(table: &MappingTable, options: &BatchOptions) -> Result<LintReport> {
    let documents = discover_documents(&options.root, options.use_git)?;
    let corpus = Corpus::load(&options.root, &documents)?;
    let validator = Validator::new(table, &options.exempt);
    let report = docs_audit::lint(table, &corpus, |doc| validator.is_exempt(doc));

    for finding in &report.findings {
        crate::log_status!(
            "lint",
            "{} '{}' ({}): {}",
            match finding.severity {
                docs_audit::Severity::Error => "error",
                docs_audit::Severity::Warning => "warning",
            },
            finding.name,
            finding.source,
            finding.message
        );
    }
    crate::log_status!(
        "lint",
        "{} names checked, {} errors, {} warnings",
        report.names_checked,
        report.errors,
        report.warnings
    );

    Ok(report)
}

fn log_violations(violations: &[Violation]) {
    for violation in violations {
        crate::log_status!(
            "rename",
            "{}:{}:{}: {}",
            violation.document,
            violation.location.line,
            violation.location.column,
            violation.message
        );
    }
}
