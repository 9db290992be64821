//! Error types and handling for `bagzulla`.
//!
//! Annotation itself never fails. Errors come from the surrounding tooling:
//! reading input, loading configuration, and writing output.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for scripted callers

mod context;
mod structured;

pub use context::{OptionExt, ResultExt};
pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `bagzulla` operations.
#[derive(Error, Debug)]
pub enum BagzError {
    // === Input Errors ===
    /// Input file does not exist.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file exists but could not be parsed.
    #[error("Invalid config file '{path}': {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// Requested config key has no value in any layer.
    #[error("Config key not set: {key}")]
    ConfigKeyNotFound { key: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BagzError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InputNotFound { .. } => Some("Check the path, or use '-' to read stdin"),
            Self::ConfigParse { .. } => Some("Fix the YAML syntax or remove the file"),
            Self::ConfigKeyNotFound { .. } => Some("Run: bagz config --list"),
            _ => None,
        }
    }
}

/// Result type using `BagzError`.
pub type Result<T> = std::result::Result<T, BagzError>;
