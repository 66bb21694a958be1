//! Unified error types for the templar core.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur during templar operations.
#[derive(Error, Debug)]
pub enum TemplarError {
    // --- Configuration ---

    /// The configuration file was not found or could not be read.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The placeholder pattern does not compile or lacks a capturing group.
    #[error("invalid placeholder pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An explicitly configured macro file exists but is not a JSON object.
    #[error("failed to parse macro file at {path}: {reason}")]
    ProviderFile { path: PathBuf, reason: String },

    // --- Template index ---

    /// A required field is missing or empty.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown template id, or the backing file of a template is missing.
    #[error("template {0} not found")]
    NotFound(String),

    /// `index.json` exists but cannot be parsed.
    #[error("template index at {path} is corrupt")]
    CorruptIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the index or a template file failed.
    #[error("storage error at {path}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A change listener rejected the new index. The index file is already written.
    #[error("index change listener failed")]
    Subscriber(#[source] anyhow::Error),

    // --- Instantiation ---

    /// The file an instantiation would produce already exists.
    #[error("file {0} already exists")]
    AlreadyExists(PathBuf),

    /// The backing template file could not be read.
    #[error("template file {path} is unreadable")]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the resolved content to its target failed.
    #[error("failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TemplarError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Alias for `Result<T, TemplarError>`.
pub type Result<T> = std::result::Result<T, TemplarError>;
