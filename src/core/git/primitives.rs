use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::utils::command;

/// List markdown files git knows about under `path`: tracked plus untracked
/// files not ignored by `.gitignore`. Paths are relative to `path`.
pub fn list_tracked_markdown_files(path: &Path) -> Result<Vec<String>> {
    let stdout = command::run_in(
        &path.to_string_lossy(),
        "git",
        &[
            "ls-files",
            "--cached",
            "--others",
            "--exclude-standard",
            "*.md",
        ],
        "git ls-files",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;

    let mut files: Vec<String> = stdout
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

pub fn is_git_repo(path: &str) -> bool {
    command::succeeded_in(path, "git", &["rev-parse", "--git-dir"])
}

/// Check whether a root-relative path (file or directory) has tracked content.
///
/// `ls-files` prints nothing for untracked paths; any failure counts as
/// untracked so the caller falls back to a plain move.
pub fn is_tracked(root: &Path, relative: &str) -> bool {
    let output = Command::new("git")
        .args(["ls-files", "--", relative])
        .current_dir(root)
        .output();

    match output {
        Ok(o) if o.status.success() => !o.stdout.is_empty(),
        _ => false,
    }
}

/// `git mv` a root-relative path, keeping its history.
pub fn move_path(root: &Path, from: &str, to: &str) -> Result<()> {
    command::run_in(
        &root.to_string_lossy(),
        "git",
        &["mv", from, to],
        &format!("git mv {} {}", from, to),
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}
