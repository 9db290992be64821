//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::BagzError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,
    /// Config parse error
    ConfigParseError,
    /// Config key has no value
    ConfigKeyNotFound,

    // === I/O Errors (exit code 8) ===
    /// Input file missing
    InputNotFound,
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigParseError => "CONFIG_PARSE_ERROR",
            Self::ConfigKeyNotFound => "CONFIG_KEY_NOT_FOUND",
            Self::InputNotFound => "INPUT_NOT_FOUND",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller might succeed by fixing its input and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::InputNotFound | Self::ConfigKeyNotFound)
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError | Self::ConfigParseError | Self::ConfigKeyNotFound => 7,
            Self::InputNotFound | Self::IoError | Self::JsonError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `BagzError`.
    #[must_use]
    pub fn from_error(err: &BagzError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = err.suggestion().map(str::to_string);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Convert to JSON value for output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &BagzError) -> (ErrorCode, Option<Value>) {
        match err {
            BagzError::InputNotFound { path } => (
                ErrorCode::InputNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            BagzError::Config(_) => (ErrorCode::ConfigError, None),
            BagzError::ConfigParse { path, .. } => (
                ErrorCode::ConfigParseError,
                Some(json!({"path": path.display().to_string()})),
            ),
            BagzError::ConfigKeyNotFound { key } => {
                (ErrorCode::ConfigKeyNotFound, Some(json!({"key": key})))
            }
            BagzError::Io(_) => (ErrorCode::IoError, None),
            BagzError::Json(_) => (ErrorCode::JsonError, None),
            BagzError::WithContext { source, .. } => {
                let code = if source.is::<std::io::Error>() {
                    ErrorCode::IoError
                } else {
                    ErrorCode::InternalError
                };
                (code, None)
            }
        }
    }
}
