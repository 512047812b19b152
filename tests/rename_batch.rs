use std::fs;
use std::path::Path;
use std::process::Command;

use catalog_rename::catalog::{DirectoryRenameRecord, MappingTable, RenameRecord};
use catalog_rename::docs_audit::ViolationKind;
use catalog_rename::engine::{self, BatchOptions, BatchState};
use catalog_rename::refactor::MoveStatus;
use catalog_rename::ErrorCode;
use tempfile::TempDir;

const README: &str = "# Catalog

## Rules as Code

See [Rules as Code](#rules-as-code) and the [example](examples/rules-as-code/README.md).
";

const EXAMPLE_README: &str = "# Rules as Code

Back to the [catalog](../../README.md#rules-as-code).
";

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn catalog() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "README.md", README);
    write(temp.path(), "examples/rules-as-code/README.md", EXAMPLE_README);
    write(temp.path(), "examples/rules-as-code/rules.yaml", "rules: []\n");
    temp
}

fn table() -> MappingTable {
    MappingTable {
        records: vec![RenameRecord::pattern("Rules as Code", "Codified Rules")],
        directories: vec![DirectoryRenameRecord::new(
            "examples/rules-as-code",
            "examples/codified-rules",
        )],
    }
}

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(["-c", "user.email=test@example.com", "-c", "user.name=Test"])
        .args(args)
        .current_dir(root)
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_string())
}

fn options(root: &Path, dry_run: bool) -> BatchOptions {
    BatchOptions {
        root: root.to_path_buf(),
        dry_run,
        use_git: false,
        exempt: vec!["PATTERN_MIGRATION_GUIDE.md".to_string()],
    }
}

#[test]
fn batch_rewrites_documents_and_moves_directories() {
    let temp = catalog();
    let root = temp.path();

    let report = engine::run(&table(), &options(root, false)).unwrap();

    assert_eq!(report.state, BatchState::Validated, "{:?}", report.violations);
    assert!(report.passed());
    assert_eq!(report.summary.documents_scanned, 2);
    assert_eq!(report.summary.documents_rewritten, 2);
    assert_eq!(report.summary.directories_moved, 1);

    let readme = read(root, "README.md");
    assert!(readme.contains("## Codified Rules"));
    assert!(readme.contains("[Codified Rules](#codified-rules)"));
    assert!(readme.contains("(examples/codified-rules/README.md)"));
    assert!(!readme.contains("Rules as Code"));

    assert!(!root.join("examples/rules-as-code").exists());
    assert_eq!(read(root, "examples/codified-rules/rules.yaml"), "rules: []\n");
    let example = read(root, "examples/codified-rules/README.md");
    assert!(example.starts_with("# Codified Rules\n"));
    assert!(example.contains("(../../README.md#codified-rules)"));
}

#[test]
fn dry_run_writes_nothing_but_validates_the_result() {
    let temp = catalog();
    let root = temp.path();

    let report = engine::run(&table(), &options(root, true)).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.summary.documents_scanned, 2);
    assert_eq!(report.state, BatchState::Validated, "{:?}", report.violations);
    assert_eq!(report.summary.documents_rewritten, 2);
    assert_eq!(report.moves.len(), 1);
    assert_eq!(report.moves[0].status, MoveStatus::Pending);
    assert!(report.moves[0].backend.is_none());

    assert_eq!(read(root, "README.md"), README);
    assert_eq!(read(root, "examples/rules-as-code/README.md"), EXAMPLE_README);
    assert!(!root.join("examples/codified-rules").exists());
}

#[test]
fn colliding_new_anchors_refuse_the_batch_before_any_write() {
    let temp = catalog();
    let root = temp.path();
    let table = MappingTable {
        records: vec![
            RenameRecord::pattern("AI Security Sandbox", "Security Sandbox"),
            RenameRecord::pattern("Sandboxed AI Security", "Security-Sandbox"),
        ],
        directories: table().directories,
    };

    let err = engine::run(&table, &options(root, false)).unwrap_err();

    assert_eq!(err.code, ErrorCode::RenamePreconditionViolation);
    assert_eq!(err.details["stage"], "mapping_table");
    assert_eq!(err.details["problems"][0]["kind"], "duplicate_new_anchor");
    assert_eq!(err.details["problems"][0]["subject"], "security-sandbox");

    assert_eq!(read(root, "README.md"), README);
    assert!(root.join("examples/rules-as-code").exists());
}

#[test]
fn missing_move_source_refuses_the_batch_before_any_write() {
    let temp = catalog();
    let root = temp.path();
    let mut table = table();
    table
        .directories
        .push(DirectoryRenameRecord::new("examples/ai-tool-integration", "examples/tool-integration"));

    let err = engine::run(&table, &options(root, false)).unwrap_err();

    assert_eq!(err.code, ErrorCode::RenamePreconditionViolation);
    assert_eq!(err.details["stage"], "directory_moves");
    assert_eq!(read(root, "README.md"), README);
    assert!(root.join("examples/rules-as-code").exists());
}

#[test]
fn rerunning_a_finished_batch_is_a_no_op() {
    let temp = catalog();
    let root = temp.path();
    engine::run(&table(), &options(root, false)).unwrap();
    let readme = read(root, "README.md");

    let report = engine::run(&table(), &options(root, false)).unwrap();

    assert!(report.passed(), "{:?}", report.violations);
    assert_eq!(report.summary.documents_rewritten, 0);
    assert_eq!(report.summary.directories_moved, 0);
    assert_eq!(report.summary.directories_already_applied, 1);
    assert_eq!(report.moves[0].status, MoveStatus::AlreadyApplied);
    assert_eq!(read(root, "README.md"), readme);
}

#[test]
fn chained_directory_moves_run_in_dependency_order() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "README.md", "# Catalog\n");
    write(root, "examples/a/README.md", "# A\n");
    write(root, "examples/b/README.md", "# B\n");
    let table = MappingTable {
        records: vec![],
        directories: vec![
            DirectoryRenameRecord::new("examples/a", "examples/b"),
            DirectoryRenameRecord::new("examples/b", "examples/c"),
        ],
    };

    let report = engine::run(&table, &options(root, false)).unwrap();

    assert_eq!(report.summary.directories_moved, 2);
    assert_eq!(report.moves[0].from, "examples/b");
    assert_eq!(read(root, "examples/b/README.md"), "# A\n");
    assert_eq!(read(root, "examples/c/README.md"), "# B\n");
    assert!(!root.join("examples/a").exists());
}

#[test]
fn exempt_documents_keep_the_old_names() {
    let temp = catalog();
    let root = temp.path();
    let guide = "# Migration\n\n`Rules as Code` is now `Codified Rules`.\n";
    write(root, "PATTERN_MIGRATION_GUIDE.md", guide);

    let report = engine::run(&table(), &options(root, false)).unwrap();

    assert!(report.passed(), "{:?}", report.violations);
    assert_eq!(read(root, "PATTERN_MIGRATION_GUIDE.md"), guide);
    assert!(report
        .documents
        .iter()
        .all(|d| d.document != "PATTERN_MIGRATION_GUIDE.md"));
}

#[test]
fn broken_links_leave_the_batch_failed() {
    let temp = catalog();
    let root = temp.path();
    write(root, "GUIDE.md", "# Guide\n\nSee [setup](docs/setup.md).\n");

    let report = engine::run(&table(), &options(root, false)).unwrap();

    assert_eq!(report.state, BatchState::Failed);
    assert!(!report.passed());
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::BrokenLink);
    assert_eq!(report.violations[0].document, "GUIDE.md");
}

#[test]
fn check_reports_stale_references_without_touching_the_tree() {
    let temp = catalog();
    let root = temp.path();

    let (summary, violations) = engine::check(&table(), &options(root, true)).unwrap();

    assert_eq!(summary.docs_scanned, 2);
    assert_eq!(summary.violations, violations.len());
    assert!(summary.by_kind.contains_key("stale_name"));
    assert!(summary.by_kind.contains_key("stale_anchor"));
    assert!(summary.by_kind.contains_key("stale_path"));
    assert_eq!(read(root, "README.md"), README);
}

#[test]
fn lint_flags_document_antipattern_headings() {
    let temp = catalog();
    let root = temp.path();
    write(root, "antipatterns.md", "### Anti-Pattern: Careful Trust\n");

    let report = engine::lint(&table(), &options(root, true)).unwrap();

    assert!(!report.passed());
    assert_eq!(report.errors, 1);
    assert_eq!(report.findings[0].rule, "negative_indicator");
    assert_eq!(report.findings[0].source, "antipatterns.md");
}

#[test]
fn git_work_tree_moves_keep_files_tracked() {
    let temp = catalog();
    let root = temp.path();
    if git(root, &["init", "-q"]).is_none() {
        // git unavailable in this environment
        return;
    }
    git(root, &["add", "."]).unwrap();
    git(root, &["commit", "-q", "-m", "catalog"]).unwrap();

    let mut options = options(root, false);
    options.use_git = true;
    let report = engine::run(&table(), &options).unwrap();

    assert!(report.passed(), "{:?}", report.violations);
    assert_eq!(report.moves[0].backend.as_deref(), Some("git"));

    let tracked = git(root, &["ls-files"]).unwrap();
    assert!(tracked.lines().any(|l| l == "examples/codified-rules/README.md"));
    assert!(tracked.lines().any(|l| l == "examples/codified-rules/rules.yaml"));
    assert!(!tracked.contains("examples/rules-as-code/"));

    let status = git(root, &["status", "--porcelain"]).unwrap();
    assert!(status.lines().any(|l| l.starts_with("R") && l.contains("examples/codified-rules/rules.yaml")));
}

#[test]
fn new_name_containing_the_old_name_validates_and_reruns_cleanly() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "README.md", "## Code Review\n\nSee [Code Review](#code-review).\n");
    let table = MappingTable {
        records: vec![RenameRecord::pattern("Code Review", "AI Code Review")],
        directories: vec![],
    };

    let report = engine::run(&table, &options(root, false)).unwrap();
    assert!(report.passed(), "{:?}", report.violations);
    assert!(report.chained.iter().any(|c| c.contained));
    assert_eq!(
        read(root, "README.md"),
        "## AI Code Review\n\nSee [AI Code Review](#ai-code-review).\n"
    );

    let again = engine::run(&table, &options(root, false)).unwrap();
    assert!(again.passed(), "{:?}", again.violations);
    assert_eq!(again.summary.replacements, 0);
    assert_eq!(
        read(root, "README.md"),
        "## AI Code Review\n\nSee [AI Code Review](#ai-code-review).\n"
    );
}
