//! Process execution primitives with consistent error handling.

use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Run a program in `dir` and return its trimmed stdout.
///
/// A spawn failure or non-zero exit becomes `internal.io_error` carrying
/// `context`; callers re-wrap it when a more specific code applies.
pub fn run_in(dir: &str, program: &str, args: &[&str], context: &str) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| {
            Error::internal_io(
                format!("Failed to run {}: {}", context, e),
                Some(context.to_string()),
            )
        })?;

    if !output.status.success() {
        return Err(Error::internal_io(
            format!("{} failed: {}", context, error_text(&output)),
            Some(context.to_string()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check if a program exits successfully in `dir`, discarding its output.
pub fn succeeded_in(dir: &str, program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Stderr of a finished process, or stdout when stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_in_returns_trimmed_stdout() {
        assert_eq!(run_in("/", "echo", &["hello"], "echo").unwrap(), "hello");
    }

    #[test]
    fn run_in_reports_missing_program() {
        let err = run_in("/", "nonexistent_command_xyz", &[], "spawn").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.details["context"], "spawn");
    }

    #[test]
    fn succeeded_in_is_false_for_failing_program() {
        assert!(!succeeded_in("/", "false", &[]));
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = Output {
            status: std::process::ExitStatus::default(),
            stdout: b"stdout content".to_vec(),
            stderr: b"  ".to_vec(),
        };
        assert_eq!(error_text(&output), "stdout content");
    }
}
