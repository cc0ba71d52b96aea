//! Unified error handling for forkgroup
//!
//! Every failure the orchestrator can observe is an [`OrchestratorError`].
//! The category decides how the binary reports it; exec failures never show up
//! here because they are confined to the child that failed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use nix::unistd::Pid;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Fewer than one process requested
    #[error("Invalid process count: must be at least 1")]
    InvalidProcessCount,

    /// Exec slot outside `[0, process_count)`
    #[error("Invalid exec_index: {index} (should be from 0 to {max})")]
    InvalidExecIndex { index: i64, max: i64 },

    /// A numeric field that did not parse
    #[error("Invalid {field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("No command given for the exec slot")]
    EmptyCommand,

    /// Interactive token variant ran past its fixed capacity
    #[error("Command has {count} tokens, at most {capacity} are supported")]
    TooManyTokens { count: usize, capacity: usize },

    #[error("Invalid command argument: {0}")]
    InvalidArgument(String),

    #[error("Settings error ({path}): {message}")]
    Settings { path: PathBuf, message: String },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Child registry could not be reserved for the requested count
    #[error("cannot allocate a registry for {count} children: {message}")]
    Allocation { count: usize, message: String },

    #[error("fork failed for child #{index}: {source}")]
    SpawnFailed {
        index: usize,
        #[source]
        source: nix::Error,
    },

    #[error("failed to signal PID {pid}: {source}")]
    Signal {
        pid: Pid,
        #[source]
        source: nix::Error,
    },

    #[error("failed to reap PID {pid}: {source}")]
    Reap {
        pid: Pid,
        #[source]
        source: nix::Error,
    },
}

impl OrchestratorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::InvalidProcessCount
            | OrchestratorError::InvalidExecIndex { .. }
            | OrchestratorError::InvalidNumber { .. }
            | OrchestratorError::EmptyCommand
            | OrchestratorError::TooManyTokens { .. }
            | OrchestratorError::InvalidArgument(_)
            | OrchestratorError::Settings { .. } => ErrorCategory::Config,
            OrchestratorError::Prompt(_) | OrchestratorError::Io(_) => ErrorCategory::Io,
            OrchestratorError::Allocation { .. } | OrchestratorError::SpawnFailed { .. } => {
                ErrorCategory::Resource
            }
            OrchestratorError::Signal { .. } | OrchestratorError::Reap { .. } => {
                ErrorCategory::Process
            }
        }
    }

    /// Whether the whole program must stop on this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Process)
    }

    /// Message shown to the user on stderr
    pub fn user_message(&self) -> String {
        match self.category() {
            // Config messages are already complete sentences.
            ErrorCategory::Config => self.to_string(),
            category => format!("{} error: {}", category.display_name(), self),
        }
    }
}

impl From<dialoguer::Error> for OrchestratorError {
    fn from(err: dialoguer::Error) -> Self {
        OrchestratorError::Prompt(err.to_string())
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    Resource,
    Process,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorCategory::Config => "Configuration",
            ErrorCategory::Io => "IO",
            ErrorCategory::Resource => "Resource",
            ErrorCategory::Process => "Process",
        }
    }
}

/// Result type alias for convenience
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
