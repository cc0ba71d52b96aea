//! Command line definition
//!
//! Options must come before the positionals; everything after the process
//! count is taken literally, so `forkgroup 3 1 ps -ef` passes `-ef` to `ps`.

use crate::config::Settings;
use clap::Parser;
use std::path::PathBuf;

/// Positional arguments needed to skip the interactive prompts
pub const POSITIONAL_MIN_ARGS: usize = 3;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "forkgroup",
    version,
    about = "Fork a group of workers, exec one of them, then kill and reap them all",
    after_help = "With fewer than three positional arguments the values are asked for interactively."
)]
pub struct Cli {
    /// Delay before the first snapshot, in milliseconds
    #[arg(long, value_name = "MS")]
    pub snapshot_delay_ms: Option<u64>,

    /// Delay between the first snapshot and termination, in milliseconds
    #[arg(long, value_name = "MS")]
    pub termination_delay_ms: Option<u64>,

    /// Period of the children's status line, in milliseconds
    #[arg(long, value_name = "MS")]
    pub report_interval_ms: Option<u64>,

    /// Screen capture utility, called as `<TOOL> <FILE>`
    #[arg(long, value_name = "TOOL")]
    pub snapshot_tool: Option<String>,

    /// Directory the captures are written to
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Use one literal file name for both captures
    #[arg(long, value_name = "FILE")]
    pub fixed_snapshot_name: Option<String>,

    /// Do not take any captures
    #[arg(long)]
    pub no_snapshot: bool,

    /// Run the interactive command line through `sh -c` instead of splitting it
    #[arg(long)]
    pub shell: bool,

    /// TOML settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `forkgroup=trace` (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// PROCESS_COUNT EXEC_INDEX COMMAND...
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    pub fn parse_command() -> Self {
        Self::parse()
    }

    pub fn try_parse_command_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    pub fn is_positional(&self) -> bool {
        self.args.len() >= POSITIONAL_MIN_ARGS
    }

    /// Flags take precedence over file and environment settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(ms) = self.snapshot_delay_ms {
            settings.snapshot_delay_ms = ms;
        }
        if let Some(ms) = self.termination_delay_ms {
            settings.termination_delay_ms = ms;
        }
        if let Some(ms) = self.report_interval_ms {
            settings.report_interval_ms = ms;
        }
        if let Some(tool) = &self.snapshot_tool {
            settings.snapshot.tool = tool.clone();
        }
        if let Some(dir) = &self.snapshot_dir {
            settings.snapshot.directory = Some(dir.clone());
        }
        if let Some(name) = &self.fixed_snapshot_name {
            settings.snapshot.fixed_name = Some(name.clone());
        }
        if self.no_snapshot {
            settings.snapshot.enabled = false;
        }
    }
}
