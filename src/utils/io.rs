//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Read a UTF-8 file, mapping failures to `internal.io_error` with `operation`
/// as context.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Replace a file's content through a sibling `.tmp` file and a rename, so
/// the document is never left half-written.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let invalid = || {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    };
    let parent = path.parent().ok_or_else(invalid)?;
    let filename = path.file_name().ok_or_else(invalid)?;
    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_file_reports_missing_file() {
        let err = read_file(Path::new("/nonexistent/table.json"), "read table").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.details["context"], "read table");
    }

    #[test]
    fn atomic_write_replaces_content_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("README.md");
        fs::write(&path, "## Rules as Code\n").unwrap();

        write_file_atomic(&path, "## Codified Rules\n", "write README.md").unwrap();

        assert_eq!(read_file(&path, "read").unwrap(), "## Codified Rules\n");
        assert!(!temp.path().join("README.md.tmp").exists());
    }

    #[test]
    fn atomic_write_fails_for_missing_directory() {
        let err = write_file_atomic(Path::new("/nonexistent/dir/a.md"), "x", "write").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
