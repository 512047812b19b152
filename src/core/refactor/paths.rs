//! Path rewriter — move directories in a safe order, keeping git history.
//!
//! The whole batch is planned before anything moves:
//! 1. Every record is classified (pending, already applied, or a problem)
//! 2. Targets are checked for collisions and nesting conflicts
//! 3. Pending moves are ordered so a target is vacated before it is filled
//!    and children move before their parents
//! 4. Any problem refuses the batch with nothing touched

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::catalog::DirectoryRenameRecord;
use crate::error::{Error, MoveFailedDetails, MovePair, PreconditionProblem, Result};
use crate::git;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// Source present, target free (or vacated earlier in the batch).
    Pending,
    /// Source gone and target present: a previous run already did this.
    AlreadyApplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub old_path: String,
    pub new_path: String,
    pub status: MoveStatus,
}

/// A validated, ordered batch of directory moves.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MovePlan {
    pub moves: Vec<PlannedMove>,
}

impl MovePlan {
    pub fn pending(&self) -> impl Iterator<Item = &PlannedMove> {
        self.moves.iter().filter(|m| m.status == MoveStatus::Pending)
    }

    /// Rewrite a root-relative path as it will read once the plan has run.
    pub fn map_path(&self, path: &str) -> String {
        let mut current = path.to_string();
        for planned in self.pending() {
            if let Some(mapped) = map_under(&current, &planned.old_path, &planned.new_path) {
                current = mapped;
            }
        }
        current
    }
}

/// What happened to one planned move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub from: String,
    pub to: String,
    pub status: MoveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

// ============================================================================
// Path helpers
// ============================================================================

/// True when `path` lies somewhere beneath `dir` (not `dir` itself).
pub(crate) fn is_strictly_within(path: &str, dir: &str) -> bool {
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

/// Map `path` through a single `old → new` move, if it is affected.
pub(crate) fn map_under(path: &str, old: &str, new: &str) -> Option<String> {
    if path == old {
        Some(new.to_string())
    } else if is_strictly_within(path, old) {
        Some(format!("{}{}", new, &path[old.len()..]))
    } else {
        None
    }
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

// ============================================================================
// Ordering
// ============================================================================

/// Order records so every move runs after the moves it depends on.
///
/// - If X's target is Y's source, Y runs first (it vacates the target).
/// - If X's source is inside Y's source, X runs first (children before parents).
///
/// Ties are broken deepest-first, then by path. Returns the ordered indices and
/// the indices left over because they sit on a cycle.
pub fn execution_order(records: &[DirectoryRenameRecord]) -> (Vec<usize>, Vec<usize>) {
    let n = records.len();
    let mut blocked_by: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

    for (x, rx) in records.iter().enumerate() {
        for (y, ry) in records.iter().enumerate() {
            if x == y {
                continue;
            }
            if rx.new_path == ry.old_path {
                blocked_by[x].insert(y);
            }
            if is_strictly_within(&rx.old_path, &ry.old_path) {
                blocked_by[y].insert(x);
            }
        }
    }

    let key = |i: usize| (Reverse(depth(&records[i].old_path)), records[i].old_path.clone(), i);

    let mut ready: BTreeSet<(Reverse<usize>, String, usize)> = (0..n)
        .filter(|&i| blocked_by[i].is_empty())
        .map(key)
        .collect();
    let mut done = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(next) = ready.iter().next().cloned() {
        ready.remove(&next);
        let i = next.2;
        done[i] = true;
        order.push(i);

        for j in 0..n {
            if !done[j] && blocked_by[j].remove(&i) && blocked_by[j].is_empty() {
                ready.insert(key(j));
            }
        }
    }

    let mut cyclic: Vec<usize> = (0..n).filter(|&i| !done[i]).collect();
    cyclic.sort_by_key(|&i| key(i));
    (order, cyclic)
}

// ============================================================================
// Planning
// ============================================================================

/// Plan the moves against the tree under `root`.
pub fn plan_moves(records: &[DirectoryRenameRecord], root: &Path) -> Result<MovePlan> {
    plan_moves_with(records, |path| root.join(path).exists())
}

/// Plan the moves using `exists` to test root-relative paths.
///
/// Every problem is collected before the batch is refused.
pub fn plan_moves_with<F>(records: &[DirectoryRenameRecord], exists: F) -> Result<MovePlan>
where
    F: Fn(&str) -> bool,
{
    let mut problems = Vec::new();

    let mut targets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in records {
        targets
            .entry(record.new_path.as_str())
            .or_default()
            .push(record.old_path.as_str());
    }
    for (target, sources) in &targets {
        if sources.len() > 1 {
            problems.push(PreconditionProblem {
                kind: "target_collision".to_string(),
                subject: target.to_string(),
                message: format!(
                    "'{}' is the target of {} records: {}",
                    target,
                    sources.len(),
                    sources.join(", ")
                ),
            });
        }
    }

    let sources: BTreeSet<&str> = records.iter().map(|r| r.old_path.as_str()).collect();

    for record in records {
        let old = record.old_path.as_str();
        let new = record.new_path.as_str();

        if is_strictly_within(new, old) {
            problems.push(problem(
                "target_inside_source",
                new,
                format!("'{}' cannot move inside itself ('{}')", old, new),
            ));
        }

        for other in records {
            if std::ptr::eq(record, other) {
                continue;
            }
            if is_strictly_within(new, &other.new_path) {
                problems.push(problem(
                    "nested_target",
                    new,
                    format!("'{}' would land inside '{}', another record's target", new, other.new_path),
                ));
            }
            if is_strictly_within(new, &other.old_path) && !is_strictly_within(old, &other.old_path) {
                problems.push(problem(
                    "target_inside_moving_source",
                    new,
                    format!("'{}' would land inside '{}', which is itself being moved", new, other.old_path),
                ));
            }
        }
    }

    let mut status: Vec<Option<MoveStatus>> = vec![None; records.len()];
    for (i, record) in records.iter().enumerate() {
        let old = record.old_path.as_str();
        let new = record.new_path.as_str();
        let old_exists = exists(old);
        let new_exists = exists(new);
        let target_vacated = sources.contains(new);

        status[i] = match (old_exists, new_exists) {
            (true, false) => Some(MoveStatus::Pending),
            (true, true) if target_vacated => Some(MoveStatus::Pending),
            (true, true) => {
                problems.push(problem(
                    "target_exists",
                    new,
                    format!("'{}' already exists; refusing to overwrite it with '{}'", new, old),
                ));
                None
            }
            (false, true) if !target_vacated => Some(MoveStatus::AlreadyApplied),
            _ => {
                problems.push(problem(
                    "missing_source",
                    old,
                    format!("'{}' does not exist", old),
                ));
                None
            }
        };
    }

    let (order, cyclic) = execution_order(records);
    if !cyclic.is_empty() {
        let members: Vec<String> = cyclic
            .iter()
            .map(|&i| format!("{} → {}", records[i].old_path, records[i].new_path))
            .collect();
        problems.push(problem(
            "cycle",
            members.join(", "),
            format!("Moves form a cycle: {}", members.join(", ")),
        ));
    }

    if !problems.is_empty() {
        return Err(Error::rename_precondition_violation("directory_moves", problems));
    }

    let moves = order
        .into_iter()
        .filter_map(|i| {
            status[i].map(|status| PlannedMove {
                old_path: records[i].old_path.clone(),
                new_path: records[i].new_path.clone(),
                status,
            })
        })
        .collect();

    Ok(MovePlan { moves })
}

fn problem(kind: &str, subject: impl Into<String>, message: String) -> PreconditionProblem {
    PreconditionProblem {
        kind: kind.to_string(),
        subject: subject.into(),
        message,
    }
}

// ============================================================================
// Backends
// ============================================================================

/// How a single directory is moved on disk.
pub trait MoveBackend {
    fn name(&self) -> &'static str;
    fn move_path(&self, root: &Path, from: &str, to: &str) -> Result<()>;
}

/// Plain filesystem move: rename, falling back to copy + delete.
pub struct FsBackend;

impl MoveBackend for FsBackend {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn move_path(&self, root: &Path, from: &str, to: &str) -> Result<()> {
        let source = root.join(from);
        let target = root.join(to);
        ensure_parent(&target)?;

        if fs::rename(&source, &target).is_ok() {
            return Ok(());
        }

        copy_recursive(&source, &target)?;
        let removed = if source.is_dir() {
            fs::remove_dir_all(&source)
        } else {
            fs::remove_file(&source)
        };
        removed.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("remove {}", source.display())))
        })
    }
}

/// `git mv` for tracked paths so history follows the move; untracked paths
/// go through the filesystem backend.
pub struct GitBackend;

impl MoveBackend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    fn move_path(&self, root: &Path, from: &str, to: &str) -> Result<()> {
        if !git::is_tracked(root, from) {
            return FsBackend.move_path(root, from, to);
        }
        ensure_parent(&root.join(to))?;
        git::move_path(root, from, to)
    }
}

/// Pick git when the root is a work tree and git use is allowed.
pub fn select_backend(root: &Path, allow_git: bool) -> Box<dyn MoveBackend> {
    if allow_git && git::is_git_repo(&root.to_string_lossy()) {
        Box::new(GitBackend)
    } else {
        Box::new(FsBackend)
    }
}

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }
    Ok(())
}

fn copy_recursive(source: &Path, target: &Path) -> Result<()> {
    let io_err = |e: std::io::Error, what: &Path| {
        Error::internal_io(e.to_string(), Some(format!("copy {}", what.display())))
    };

    if source.is_dir() {
        fs::create_dir_all(target).map_err(|e| io_err(e, target))?;
        for entry in fs::read_dir(source).map_err(|e| io_err(e, source))? {
            let entry = entry.map_err(|e| io_err(e, source))?;
            copy_recursive(&entry.path(), &target.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(source, target).map_err(|e| io_err(e, source))?;
        Ok(())
    }
}

// ============================================================================
// Apply
// ============================================================================

/// Execute a plan. Stops at the first failure and reports what completed and
/// what is still pending.
pub fn apply_moves(plan: &MovePlan, root: &Path, backend: &dyn MoveBackend) -> Result<Vec<MoveOutcome>> {
    let mut outcomes = Vec::new();
    let mut completed: Vec<MovePair> = Vec::new();

    for (i, planned) in plan.moves.iter().enumerate() {
        if planned.status == MoveStatus::AlreadyApplied {
            crate::log_status!(
                "rename",
                "skip {} → {} (already applied)",
                planned.old_path,
                planned.new_path
            );
            outcomes.push(MoveOutcome {
                from: planned.old_path.clone(),
                to: planned.new_path.clone(),
                status: MoveStatus::AlreadyApplied,
                backend: None,
            });
            continue;
        }

        if let Err(err) = backend.move_path(root, &planned.old_path, &planned.new_path) {
            let pending = plan.moves[i + 1..]
                .iter()
                .filter(|m| m.status == MoveStatus::Pending)
                .map(|m| MovePair {
                    from: m.old_path.clone(),
                    to: m.new_path.clone(),
                })
                .collect();

            return Err(Error::rename_move_failed(MoveFailedDetails {
                failed: MovePair {
                    from: planned.old_path.clone(),
                    to: planned.new_path.clone(),
                },
                error: err.to_string(),
                backend: backend.name().to_string(),
                completed,
                pending,
            }));
        }

        crate::log_status!(
            "rename",
            "moved {} → {} ({})",
            planned.old_path,
            planned.new_path,
            backend.name()
        );
        completed.push(MovePair {
            from: planned.old_path.clone(),
            to: planned.new_path.clone(),
        });
        outcomes.push(MoveOutcome {
            from: planned.old_path.clone(),
            to: planned.new_path.clone(),
            status: MoveStatus::Pending,
            backend: Some(backend.name().to_string()),
        });
    }

    Ok(outcomes)
}

// ============================================================================
// Tests
// ============================================================================
