//! forkgroup Library
//!
//! Process group orchestration: fork N children, turn one into an external
//! command via exec, keep the rest in a reporting loop, then kill and reap the
//! whole group on a fixed timeline with best-effort snapshots along the way.

#[cfg(not(unix))]
compile_error!("forkgroup relies on fork/exec and only supports Unix platforms");

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod platform;
pub mod snapshot;
pub mod supervisor;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{Settings, Timeline};
pub use core::models::{ChildRegistry, ChildRole, Configuration, ExecCommand};
pub use error::{ErrorCategory, OrchestratorError, OrchestratorResult};
pub use snapshot::{SnapshotCollaborator, SnapshotLabel, SnapshotOutcome};
pub use supervisor::{Orchestrator, ReapReport, RunSummary};
