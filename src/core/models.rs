//! Data model for a process group run
//!
//! `Configuration` is built once and never mutated. `ChildRegistry` is filled
//! in spawn order and read-only afterwards.

use crate::error::{OrchestratorError, OrchestratorResult};
use nix::unistd::Pid;
use std::ffi::CString;
use std::fmt;
use std::path::Path;

/// Argument vector for the exec slot; element 0 is the program, looked up on `PATH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCommand {
    argv: Vec<String>,
}

impl ExecCommand {
    pub fn new<I, S>(argv: I) -> OrchestratorResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.first().map_or(true, |program| program.is_empty()) {
            return Err(OrchestratorError::EmptyCommand);
        }
        if let Some(bad) = argv.iter().find(|arg| arg.contains('\0')) {
            return Err(OrchestratorError::InvalidArgument(format!(
                "{bad:?} contains a NUL byte"
            )));
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// File name of the program without any directory part
    pub fn program_name(&self) -> &str {
        Path::new(self.program())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(self.program())
    }

    pub fn args(&self) -> &[String] {
        &self.argv
    }

    /// Build the C argument vector handed to `execvp`
    pub fn to_cstrings(&self) -> OrchestratorResult<Vec<CString>> {
        self.argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_bytes())
                    .map_err(|err| OrchestratorError::InvalidArgument(err.to_string()))
            })
            .collect()
    }
}

impl fmt::Display for ExecCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Validated orchestration parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    process_count: usize,
    exec_index: usize,
    command: ExecCommand,
}

impl Configuration {
    /// An empty group has no valid slot, so a zero count is reported through
    /// the exec index range `0..=-1`.
    pub fn new(process_count: usize, exec_index: i64, command: ExecCommand) -> OrchestratorResult<Self> {
        let exec_index = validate_exec_index(exec_index, process_count)?;
        Ok(Self {
            process_count,
            exec_index,
            command,
        })
    }

    pub fn process_count(&self) -> usize {
        self.process_count
    }

    pub fn exec_index(&self) -> usize {
        self.exec_index
    }

    pub fn command(&self) -> &ExecCommand {
        &self.command
    }

    pub fn role_of(&self, index: usize) -> ChildRole {
        if index == self.exec_index {
            ChildRole::Exec
        } else {
            ChildRole::Reporter
        }
    }
}

/// Check `index` against `[0, process_count)`
pub fn validate_exec_index(index: i64, process_count: usize) -> OrchestratorResult<usize> {
    match usize::try_from(index) {
        Ok(slot) if slot < process_count => Ok(slot),
        _ => Err(OrchestratorError::InvalidExecIndex {
            index,
            max: i64::try_from(process_count).unwrap_or(i64::MAX) - 1,
        }),
    }
}

/// What a child does right after fork
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    /// Replace the image with the configured command
    Exec,
    /// Loop printing index and pid until killed
    Reporter,
}

/// Spawned pids in spawn order; slot `i` is the i-th child
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChildRegistry {
    pids: Vec<Pid>,
}

impl ChildRegistry {
    /// Reserve room for `count` pids up front, reporting allocation failure
    /// instead of aborting
    pub fn try_with_capacity(count: usize) -> OrchestratorResult<Self> {
        let mut pids = Vec::new();
        pids.try_reserve_exact(count)
            .map_err(|err| OrchestratorError::Allocation {
                count,
                message: err.to_string(),
            })?;
        Ok(Self { pids })
    }

    /// Append the pid of the next spawned child and return its slot
    pub fn record(&mut self, pid: Pid) -> usize {
        self.pids.push(pid);
        self.pids.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<Pid> {
        self.pids.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// `(slot, pid)` pairs in spawn order
    pub fn iter(&self) -> impl Iterator<Item = (usize, Pid)> + '_ {
        self.pids.iter().copied().enumerate()
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }
}
