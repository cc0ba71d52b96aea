//! Best-effort screen captures at the start and end of a run
//!
//! The capture tool is run as a plain argument vector, never through a shell.
//! Whatever happens here is reported and then ignored by the orchestrator.

use crate::config::SnapshotSettings;
use crate::core::ExecCommand;
use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Point in the timeline a capture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLabel {
    Start,
    End,
}

impl SnapshotLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotLabel::Start => "start",
            SnapshotLabel::End => "end",
        }
    }
}

impl fmt::Display for SnapshotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Saved(PathBuf),
    ToolMissing(String),
    Failed { path: PathBuf, reason: String },
    Skipped,
}

impl SnapshotOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SnapshotOutcome::Saved(_))
    }
}

pub trait SnapshotCollaborator {
    fn capture(&self, label: SnapshotLabel) -> SnapshotOutcome;
}

/// How capture files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotNaming {
    /// Same literal file for every capture
    Fixed(String),
    /// `<label>_<program>.png`
    Labeled { program: String },
}

impl SnapshotNaming {
    pub fn labeled_for(command: &ExecCommand) -> Self {
        SnapshotNaming::Labeled {
            program: sanitize(command.program_name()),
        }
    }

    pub fn file_name(&self, label: SnapshotLabel) -> String {
        match self {
            SnapshotNaming::Fixed(name) => name.clone(),
            SnapshotNaming::Labeled { program } => format!("{label}_{program}.png"),
        }
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "command".to_string()
    } else {
        cleaned
    }
}

/// Runs `<tool> <file>` and waits for it
#[derive(Debug, Clone)]
pub struct ExternalTool {
    tool: String,
    directory: Option<PathBuf>,
    naming: SnapshotNaming,
}

impl ExternalTool {
    pub fn new(tool: impl Into<String>, directory: Option<PathBuf>, naming: SnapshotNaming) -> Self {
        Self {
            tool: tool.into(),
            directory,
            naming,
        }
    }

    pub fn target_path(&self, label: SnapshotLabel) -> PathBuf {
        let file = self.naming.file_name(label);
        match &self.directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }

    fn run(&self, path: &Path) -> SnapshotOutcome {
        let program = match which::which(&self.tool) {
            Ok(program) => program,
            Err(err) => {
                debug!(tool = %self.tool, error = %err, "snapshot tool not found");
                return SnapshotOutcome::ToolMissing(self.tool.clone());
            }
        };

        let status = Command::new(&program)
            .arg(path)
            .stdin(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => SnapshotOutcome::Saved(path.to_path_buf()),
            Ok(status) => SnapshotOutcome::Failed {
                path: path.to_path_buf(),
                reason: format!("{} exited with {}", self.tool, status),
            },
            Err(err) => SnapshotOutcome::Failed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

impl SnapshotCollaborator for ExternalTool {
    fn capture(&self, label: SnapshotLabel) -> SnapshotOutcome {
        let path = self.target_path(label);
        let outcome = self.run(&path);
        match &outcome {
            SnapshotOutcome::Saved(path) => {
                println!("Screenshot saved as: {}", path.display());
            }
            SnapshotOutcome::ToolMissing(tool) => {
                warn!(%label, %tool, "snapshot tool missing");
                eprintln!(
                    "{}",
                    format!("Failed to take screenshot (is {tool} installed?)").yellow()
                );
            }
            SnapshotOutcome::Failed { reason, .. } => {
                warn!(%label, %reason, "snapshot failed");
                eprintln!(
                    "{}",
                    format!("Failed to take screenshot (is {} installed?)", self.tool).yellow()
                );
            }
            SnapshotOutcome::Skipped => {}
        }
        outcome
    }
}

/// No-op collaborator for `--no-snapshot`
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

impl SnapshotCollaborator for Disabled {
    fn capture(&self, label: SnapshotLabel) -> SnapshotOutcome {
        debug!(%label, "snapshots disabled");
        SnapshotOutcome::Skipped
    }
}

/// Build the collaborator described by `settings`
pub fn from_settings(
    settings: &SnapshotSettings,
    command: &ExecCommand,
) -> Box<dyn SnapshotCollaborator> {
    if !settings.enabled {
        return Box::new(Disabled);
    }
    let naming = match &settings.fixed_name {
        Some(name) => SnapshotNaming::Fixed(name.clone()),
        None => SnapshotNaming::labeled_for(command),
    };
    Box::new(ExternalTool::new(
        settings.tool.clone(),
        settings.directory.clone(),
        naming,
    ))
}
