//! Document discovery and the in-memory corpus the validator reads.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::git;
use crate::refactor::MovePlan;
use crate::utils::io;

/// Directories to always skip at any depth (dependency/VCS directories).
const ALWAYS_SKIP_DIRS: &[&str] = &["node_modules", "vendor", ".git", ".svn", ".hg"];

/// Directories to skip only at the root level (build output directories).
const ROOT_ONLY_SKIP_DIRS: &[&str] = &["build", "dist", "target"];

/// Root-relative paths of the markdown documents in scope, sorted.
///
/// Inside a git work tree (and with `use_git`) this is what git knows about,
/// so ignored files are left alone; otherwise the tree is walked.
pub fn discover_documents(root: &Path, use_git: bool) -> Result<Vec<String>> {
    if use_git && git::is_git_repo(&root.to_string_lossy()) {
        let mut files = git::list_tracked_markdown_files(root)?;
        // ls-files still lists tracked files deleted from the work tree
        files.retain(|f| root.join(f).is_file());
        return Ok(files);
    }

    let mut files = Vec::new();
    walk(root, "", &mut files, &mut BTreeSet::new());
    files.retain(|f| f.ends_with(".md"));
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, files: &mut Vec<String>, dirs: &mut BTreeSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };

        if path.is_dir() {
            if ALWAYS_SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            if prefix.is_empty() && ROOT_ONLY_SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            dirs.insert(relative.clone());
            walk(&path, &relative, files, dirs);
        } else {
            files.push(relative);
        }
    }
}

/// Documents plus every path that exists, all root-relative.
///
/// A corpus is either read from disk or derived from another one, so a dry
/// run can validate the tree as it would look after rewriting and moving.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: BTreeMap<String, String>,
    entries: BTreeSet<String>,
}

impl Corpus {
    /// Read `documents` under `root` and index every file and directory.
    pub fn load(root: &Path, documents: &[String]) -> Result<Self> {
        let mut contents = BTreeMap::new();
        for doc in documents {
            let content = io::read_file(&root.join(doc), &format!("read {}", doc))?;
            contents.insert(doc.clone(), content);
        }

        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        walk(root, "", &mut files, &mut dirs);

        let mut entries: BTreeSet<String> = files.into_iter().collect();
        entries.extend(dirs);
        entries.extend(documents.iter().cloned());

        Ok(Corpus {
            documents: contents,
            entries,
        })
    }

    /// A corpus with no backing tree; every document and its ancestor
    /// directories exist.
    pub fn from_documents<I, P, C>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut corpus = Corpus::default();
        for (path, content) in documents {
            corpus.insert(path.into(), content.into());
        }
        corpus
    }

    fn insert(&mut self, path: String, content: String) {
        let mut dir = path.as_str();
        while let Some(i) = dir.rfind('/') {
            dir = &dir[..i];
            self.entries.insert(dir.to_string());
        }
        self.entries.insert(path.clone());
        self.documents.insert(path, content);
    }

    /// Replace document contents (paths unchanged).
    pub fn with_contents(mut self, rewritten: BTreeMap<String, String>) -> Self {
        for (path, content) in rewritten {
            if let Some(slot) = self.documents.get_mut(&path) {
                *slot = content;
            }
        }
        self
    }

    /// The corpus as it will look once `plan` has run.
    pub fn relocated(&self, plan: &MovePlan) -> Self {
        let mut relocated = Corpus::default();
        for path in &self.entries {
            relocated.entries.insert(plan.map_path(path));
        }
        for (path, content) in &self.documents {
            relocated.insert(plan.map_path(path), content.clone());
        }
        // parents created for moved targets
        let mut parents = Vec::new();
        for entry in &relocated.entries {
            let mut dir = entry.as_str();
            while let Some(i) = dir.rfind('/') {
                dir = &dir[..i];
                parents.push(dir.to_string());
            }
        }
        relocated.entries.extend(parents);
        relocated
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn document(&self, path: &str) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether a root-relative file or directory exists (`""` is the root).
    pub fn exists(&self, path: &str) -> bool {
        path.is_empty() || self.entries.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DirectoryRenameRecord;
    use crate::refactor::plan_moves_with;
    use tempfile::TempDir;

    #[test]
    fn walk_skips_dependency_and_root_build_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["docs", "node_modules/pkg", "build", "scripts/build", "docs/vendor"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in [
            "README.md",
            "docs/guide.md",
            "docs/notes.txt",
            "node_modules/pkg/README.md",
            "build/out.md",
            "scripts/build/steps.md",
            "docs/vendor/lib.md",
        ] {
            fs::write(root.join(file), "# x\n").unwrap();
        }

        let docs = discover_documents(root, false).unwrap();
        assert_eq!(docs, vec!["README.md", "docs/guide.md", "scripts/build/steps.md"]);
    }

    #[test]
    fn load_indexes_files_and_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("examples/rules-as-code")).unwrap();
        fs::write(root.join("README.md"), "# Catalog\n").unwrap();
        fs::write(root.join("examples/rules-as-code/rules.yaml"), "x: 1\n").unwrap();

        let docs = discover_documents(root, false).unwrap();
        let corpus = Corpus::load(root, &docs).unwrap();

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.document("README.md"), Some("# Catalog\n"));
        assert!(corpus.exists("examples"));
        assert!(corpus.exists("examples/rules-as-code/rules.yaml"));
        assert!(!corpus.exists("examples/codified-rules"));
    }

    #[test]
    fn relocated_corpus_follows_the_plan() {
        let corpus = Corpus::from_documents([
            ("README.md", "# Catalog\n"),
            ("examples/rules-as-code/README.md", "# Rules\n"),
        ]);
        let records = vec![DirectoryRenameRecord::new(
            "examples/rules-as-code",
            "examples/codified-rules",
        )];
        let plan = plan_moves_with(&records, |p| corpus.exists(p)).unwrap();

        let moved = corpus.relocated(&plan);
        assert!(moved.exists("examples/codified-rules"));
        assert!(!moved.exists("examples/rules-as-code"));
        assert_eq!(moved.document("examples/codified-rules/README.md"), Some("# Rules\n"));
    }
}
