//! Error taxonomy for board operations.
//!
//! Every failure the core can report maps to one closed [`ErrorCode`]. The
//! code decides the process exit status and the `error_code` field of the
//! JSON error body, so both must stay stable across releases.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type for board operations.
pub type Result<T> = std::result::Result<T, KanbanError>;

/// Machine-readable error identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BoardNotFound,
    BoardAlreadyExists,
    InvalidConfig,
    TaskNotFound,
    InvalidTaskId,
    InvalidStatus,
    InvalidPriority,
    InvalidClass,
    InvalidDate,
    InvalidInput,
    WipLimitExceeded,
    StatusBoundary,
    StatusConflict,
    TaskClaimed,
    ClaimRequired,
    NothingToPick,
    NoChanges,
    ConfirmationRequired,
    DependencyNotFound,
    SelfReference,
    InternalError,
}

impl ErrorCode {
    /// Identifier as it appears in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BoardNotFound => "BOARD_NOT_FOUND",
            ErrorCode::BoardAlreadyExists => "BOARD_ALREADY_EXISTS",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::InvalidTaskId => "INVALID_TASK_ID",
            ErrorCode::InvalidStatus => "INVALID_STATUS",
            ErrorCode::InvalidPriority => "INVALID_PRIORITY",
            ErrorCode::InvalidClass => "INVALID_CLASS",
            ErrorCode::InvalidDate => "INVALID_DATE",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::WipLimitExceeded => "WIP_LIMIT_EXCEEDED",
            ErrorCode::StatusBoundary => "STATUS_BOUNDARY",
            ErrorCode::StatusConflict => "STATUS_CONFLICT",
            ErrorCode::TaskClaimed => "TASK_CLAIMED",
            ErrorCode::ClaimRequired => "CLAIM_REQUIRED",
            ErrorCode::NothingToPick => "NOTHING_TO_PICK",
            ErrorCode::NoChanges => "NO_CHANGES",
            ErrorCode::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            ErrorCode::DependencyNotFound => "DEPENDENCY_NOT_FOUND",
            ErrorCode::SelfReference => "SELF_REFERENCE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Process exit status for this code.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::InternalError => 2,
            ErrorCode::BoardNotFound => 3,
            ErrorCode::BoardAlreadyExists => 4,
            ErrorCode::InvalidConfig => 5,
            ErrorCode::TaskNotFound => 6,
            ErrorCode::InvalidTaskId => 7,
            ErrorCode::InvalidStatus => 8,
            ErrorCode::InvalidPriority => 9,
            ErrorCode::InvalidClass => 10,
            ErrorCode::InvalidDate => 11,
            ErrorCode::InvalidInput => 12,
            ErrorCode::WipLimitExceeded => 13,
            ErrorCode::StatusBoundary => 14,
            ErrorCode::StatusConflict => 15,
            ErrorCode::TaskClaimed => 16,
            ErrorCode::ClaimRequired => 17,
            ErrorCode::NothingToPick => 18,
            ErrorCode::NoChanges => 19,
            ErrorCode::ConfirmationRequired => 20,
            ErrorCode::DependencyNotFound => 21,
            ErrorCode::SelfReference => 22,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in board operations.
#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("no kanban board found from {path} (run `kanban-md init`)")]
    BoardNotFound { path: PathBuf },

    #[error("board already exists at {path}")]
    BoardAlreadyExists { path: PathBuf },

    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("task #{id} not found")]
    TaskNotFound { id: u32 },

    #[error("invalid task id {input:?}")]
    InvalidTaskId { input: String },

    #[error("invalid status {status:?} (allowed: {})", allowed.join(", "))]
    InvalidStatus { status: String, allowed: Vec<String> },

    #[error("invalid priority {priority:?} (allowed: {})", allowed.join(", "))]
    InvalidPriority { priority: String, allowed: Vec<String> },

    #[error("invalid class {class:?} (allowed: {})", allowed.join(", "))]
    InvalidClass { class: String, allowed: Vec<String> },

    #[error("invalid date {input:?} (use YYYY-MM-DD, an RFC 3339 timestamp, today/tomorrow/yesterday or +Nd/-Nd)")]
    InvalidDate { input: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("WIP limit reached for {scope} ({current}/{limit})")]
    WipLimitExceeded {
        scope: String,
        limit: u32,
        current: usize,
    },

    #[error("task #{id} is already at the {edge} status {status:?}")]
    StatusBoundary {
        id: u32,
        status: String,
        edge: &'static str,
    },

    #[error("task #{id} is in {actual:?}, expected {expected:?}")]
    StatusConflict {
        id: u32,
        expected: String,
        actual: String,
    },

    #[error("task #{id} is claimed by {claimed_by:?}")]
    TaskClaimed { id: u32, claimed_by: String },

    #[error("status {status:?} requires a claim (use --claim <name>) for task #{id}")]
    ClaimRequired { id: u32, status: String },

    #[error("nothing to pick")]
    NothingToPick,

    #[error("no changes specified for task #{id}")]
    NoChanges { id: u32 },

    #[error("{message} (pass --yes to confirm)")]
    ConfirmationRequired { message: String },

    #[error("dependency task #{id} not found")]
    DependencyNotFound { id: u32 },

    #[error("task #{id} cannot reference itself as {field}")]
    SelfReference { id: u32, field: &'static str },

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Terminal setup or drawing failed; exits 1 rather than with a
    /// board error code.
    #[error("terminal: {0}")]
    Terminal(#[source] std::io::Error),
}

impl KanbanError {
    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BoardNotFound { .. } => ErrorCode::BoardNotFound,
            Self::BoardAlreadyExists { .. } => ErrorCode::BoardAlreadyExists,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::InvalidTaskId { .. } => ErrorCode::InvalidTaskId,
            Self::InvalidStatus { .. } => ErrorCode::InvalidStatus,
            Self::InvalidPriority { .. } => ErrorCode::InvalidPriority,
            Self::InvalidClass { .. } => ErrorCode::InvalidClass,
            Self::InvalidDate { .. } => ErrorCode::InvalidDate,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::WipLimitExceeded { .. } => ErrorCode::WipLimitExceeded,
            Self::StatusBoundary { .. } => ErrorCode::StatusBoundary,
            Self::StatusConflict { .. } => ErrorCode::StatusConflict,
            Self::TaskClaimed { .. } => ErrorCode::TaskClaimed,
            Self::ClaimRequired { .. } => ErrorCode::ClaimRequired,
            Self::NothingToPick => ErrorCode::NothingToPick,
            Self::NoChanges { .. } => ErrorCode::NoChanges,
            Self::ConfirmationRequired { .. } => ErrorCode::ConfirmationRequired,
            Self::DependencyNotFound { .. } => ErrorCode::DependencyNotFound,
            Self::SelfReference { .. } => ErrorCode::SelfReference,
            Self::Internal { .. }
            | Self::Io(_)
            | Self::Yaml(_)
            | Self::Json(_)
            | Self::Watch(_)
            | Self::Terminal(_) => ErrorCode::InternalError,
        }
    }

    /// Structured details for the JSON error body, when there are any.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::BoardNotFound { path } | Self::BoardAlreadyExists { path } => {
                Some(json!({ "path": path.display().to_string() }))
            }
            Self::TaskNotFound { id } | Self::DependencyNotFound { id } => Some(json!({ "id": id })),
            Self::InvalidStatus { allowed, .. }
            | Self::InvalidPriority { allowed, .. }
            | Self::InvalidClass { allowed, .. } => Some(json!({ "allowed": allowed })),
            Self::WipLimitExceeded {
                scope,
                limit,
                current,
            } => Some(json!({ "scope": scope, "limit": limit, "current": current })),
            Self::StatusConflict {
                expected, actual, ..
            } => Some(json!({ "expected": expected, "actual": actual })),
            Self::TaskClaimed { claimed_by, .. } => Some(json!({ "claimed_by": claimed_by })),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Terminal(_) => 1,
            _ => self.code().exit_code(),
        }
    }
}

/// JSON body emitted on stdout when a command fails in JSON mode.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&KanbanError> for ErrorBody {
    fn from(err: &KanbanError) -> Self {
        ErrorBody {
            error_code: err.code(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KanbanError::TaskNotFound { id: 7 };
        assert_eq!(err.to_string(), "task #7 not found");
    }

    #[test]
    fn test_io_errors_are_internal() {
        let err = KanbanError::from(std::io::Error::other("disk"));
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_terminal_errors_exit_one() {
        let err = KanbanError::Terminal(std::io::Error::other("no tty"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.to_string(), "terminal: no tty");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ErrorCode::BoardNotFound,
            ErrorCode::BoardAlreadyExists,
            ErrorCode::InvalidConfig,
            ErrorCode::TaskNotFound,
            ErrorCode::InvalidTaskId,
            ErrorCode::InvalidStatus,
            ErrorCode::InvalidPriority,
            ErrorCode::InvalidClass,
            ErrorCode::InvalidDate,
            ErrorCode::InvalidInput,
            ErrorCode::WipLimitExceeded,
            ErrorCode::StatusBoundary,
            ErrorCode::StatusConflict,
            ErrorCode::TaskClaimed,
            ErrorCode::ClaimRequired,
            ErrorCode::NothingToPick,
            ErrorCode::NoChanges,
            ErrorCode::ConfirmationRequired,
            ErrorCode::DependencyNotFound,
            ErrorCode::SelfReference,
            ErrorCode::InternalError,
        ];
        let mut seen = std::collections::HashSet::new();
        for code in codes {
            assert!(code.exit_code() > 1);
            assert!(seen.insert(code.exit_code()), "duplicate exit code for {code}");
        }
    }

    #[test]
    fn test_error_body_shape() {
        let err = KanbanError::WipLimitExceeded {
            scope: "status in-progress".into(),
            limit: 1,
            current: 1,
        };
        let body = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(body["error_code"], "WIP_LIMIT_EXCEEDED");
        assert_eq!(body["details"]["limit"], 1);

        let body = serde_json::to_value(ErrorBody::from(&KanbanError::NothingToPick)).unwrap();
        assert!(body.get("details").is_none());
    }
}
