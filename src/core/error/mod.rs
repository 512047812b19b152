use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,

    ValidationInvalidArgument,

    RenamePreconditionViolation,
    RenameMoveFailed,

    GitCommandFailed,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::RenamePreconditionViolation => "rename.precondition_violation",
            ErrorCode::RenameMoveFailed => "rename.move_failed",

            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

/// One reason a batch was refused before anything was touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionProblem {
    /// Machine-readable category (`duplicate_new_anchor`, `missing_source`, `cycle`, ...).
    pub kind: String,
    /// The record, anchor or path the problem is about.
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionViolationDetails {
    /// Which stage refused the batch: `mapping_table` or `directory_moves`.
    pub stage: String,
    pub problems: Vec<PreconditionProblem>,
}

/// A `from → to` pair as reported in move failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePair {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFailedDetails {
    pub failed: MovePair,
    pub error: String,
    pub backend: String,
    pub completed: Vec<MovePair>,
    pub pending: Vec<MovePair>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in mapping table",
            details,
        )
        .with_hint("The table file must be an object with `records` and `directories` arrays")
    }

    /// The batch was refused before any document or directory was touched.
    ///
    /// Nothing is retryable: the same table against the same tree fails the
    /// same way until one of them is edited.
    pub fn rename_precondition_violation(
        stage: impl Into<String>,
        problems: Vec<PreconditionProblem>,
    ) -> Self {
        let stage = stage.into();
        let message = match problems.len() {
            1 => format!("Precondition violated ({}): {}", stage, problems[0].message),
            n => format!("{} precondition violations ({})", n, stage),
        };

        let mut err = Self::new(
            ErrorCode::RenamePreconditionViolation,
            message,
            to_details(PreconditionViolationDetails { stage, problems }),
        )
        .with_hint("Fix the mapping table or the tree, then re-run; nothing was modified");
        err.retryable = Some(false);
        err
    }

    pub fn rename_move_failed(details: MoveFailedDetails) -> Self {
        let message = format!(
            "Failed to move {} → {} ({} completed, {} pending)",
            details.failed.from,
            details.failed.to,
            details.completed.len(),
            details.pending.len()
        );

        let mut err = Self::new(ErrorCode::RenameMoveFailed, message, to_details(details))
            .with_hint("The batch is half-applied: inspect `completed` and `pending` before re-running");
        err.retryable = Some(false);
        err
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_in_dotted_form() {
        let codes = [
            (ErrorCode::ConfigInvalidJson, "config.invalid_json"),
            (ErrorCode::ValidationInvalidArgument, "validation.invalid_argument"),
            (ErrorCode::RenamePreconditionViolation, "rename.precondition_violation"),
            (ErrorCode::RenameMoveFailed, "rename.move_failed"),
            (ErrorCode::GitCommandFailed, "git.command_failed"),
            (ErrorCode::InternalIoError, "internal.io_error"),
            (ErrorCode::InternalJsonError, "internal.json_error"),
        ];
        for (code, dotted) in codes {
            assert_eq!(code.as_str(), dotted);
        }
    }

    #[test]
    fn precondition_violation_lists_every_problem() {
        let err = Error::rename_precondition_violation(
            "mapping_table",
            vec![
                PreconditionProblem {
                    kind: "duplicate_new_anchor".to_string(),
                    subject: "security-sandbox".to_string(),
                    message: "two records".to_string(),
                },
                PreconditionProblem {
                    kind: "anchor_mismatch".to_string(),
                    subject: "Codified Rules".to_string(),
                    message: "bad anchor".to_string(),
                },
            ],
        );

        assert_eq!(err.code.as_str(), "rename.precondition_violation");
        assert_eq!(err.retryable, Some(false));
        assert_eq!(err.details["stage"], "mapping_table");
        assert_eq!(err.details["problems"].as_array().map(|p| p.len()), Some(2));
        assert!(err.message.starts_with("2 precondition violations"));
    }

    #[test]
    fn single_precondition_problem_is_inlined_in_message() {
        let err = Error::rename_precondition_violation(
            "directory_moves",
            vec![PreconditionProblem {
                kind: "missing_source".to_string(),
                subject: "examples/a".to_string(),
                message: "'examples/a' does not exist".to_string(),
            }],
        );

        assert!(err.message.contains("'examples/a' does not exist"));
    }

    #[test]
    fn move_failure_reports_progress() {
        let err = Error::rename_move_failed(MoveFailedDetails {
            failed: MovePair {
                from: "b".to_string(),
                to: "c".to_string(),
            },
            error: "permission denied".to_string(),
            backend: "fs".to_string(),
            completed: vec![MovePair {
                from: "x".to_string(),
                to: "y".to_string(),
            }],
            pending: vec![],
        });

        assert_eq!(err.code, ErrorCode::RenameMoveFailed);
        assert_eq!(err.details["completed"][0]["from"], "x");
        assert!(err.message.contains("1 completed, 0 pending"));
    }
}
