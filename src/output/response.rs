//! JSON envelope for command results and the exit code for each error code.

use catalog_rename::error::Hint;
use catalog_rename::{Error, ErrorCode, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

/// `{"success": true, "data": ...}` or `{"success": false, "error": ...}`.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    details: &'a Value,
    #[serde(skip_serializing_if = "<[Hint]>::is_empty")]
    hints: &'a [Hint],
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl<'a> Envelope<'a> {
    fn success(data: &'a Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(err: &'a Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: err.code.as_str(),
                message: &err.message,
                details: &err.details,
                hints: &err.hints,
                retryable: err.retryable,
            }),
        }
    }
}

/// Serializes a command's output, or maps its error to an exit code.
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidJson | ErrorCode::ValidationInvalidArgument => 2,
        ErrorCode::RenamePreconditionViolation => 3,
        ErrorCode::RenameMoveFailed | ErrorCode::GitCommandFailed => 20,
        ErrorCode::InternalIoError | ErrorCode::InternalJsonError => 1,
    }
}

pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let envelope = match &result {
        Ok(data) => Envelope::success(data),
        Err(err) => Envelope::failure(err),
    };
    let payload = serde_json::to_string_pretty(&envelope).map_err(|e| {
        Error::internal_json(e.to_string(), Some("serialize response".to_string()))
    })?;

    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{}", payload) {
        Ok(()) => Ok(()),
        // Reader went away (`| head`).
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(Error::internal_io(e.to_string(), Some("write stdout".to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_rename::error::PreconditionProblem;
    use serde_json::json;

    #[test]
    fn errors_map_to_documented_exit_codes() {
        let precondition = Error::rename_precondition_violation(
            "mapping_table",
            vec![PreconditionProblem {
                kind: "duplicate_new_anchor".to_string(),
                subject: "security-sandbox".to_string(),
                message: "two records produce #security-sandbox".to_string(),
            }],
        );
        let (result, code) = map_cmd_result_to_json::<()>(Err(precondition));
        assert!(result.is_err());
        assert_eq!(code, 3);

        let (_, code) = map_cmd_result_to_json::<()>(Err(Error::git_command_failed("mv")));
        assert_eq!(code, 20);

        let invalid = Error::validation_invalid_argument("root", "missing", None, None);
        let (_, code) = map_cmd_result_to_json::<()>(Err(invalid));
        assert_eq!(code, 2);

        let (_, code) = map_cmd_result_to_json::<()>(Err(Error::internal_json("eof", None)));
        assert_eq!(code, 1);
    }

    #[test]
    fn success_keeps_the_command_exit_code() {
        let (result, code) = map_cmd_result_to_json(Ok((json!({"violations": 2}), 1)));
        assert_eq!(code, 1);
        assert_eq!(result.unwrap()["violations"], 2);
    }

    #[test]
    fn error_envelope_carries_code_and_hints() {
        let err = Error::internal_io("denied", Some("write README.md".to_string()))
            .with_hint("check permissions");
        let value = serde_json::to_value(Envelope::failure(&err)).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "internal.io_error");
        assert_eq!(value["error"]["hints"][0]["message"], "check permissions");
        assert!(value.get("data").is_none());
        assert!(value["error"].get("retryable").is_none());
    }

    #[test]
    fn success_envelope_omits_the_error() {
        let data = json!({"command": "check", "passed": true});
        let value = serde_json::to_value(Envelope::success(&data)).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["command"], "check");
        assert!(value.get("error").is_none());
    }
}
