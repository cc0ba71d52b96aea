//! Configuration builder: positional arguments or interactive prompts

pub mod interactive;
pub mod parser;

pub use interactive::{CommandMode, LinePrompter, Prompter, TerminalPrompter};
pub use parser::{Cli, POSITIONAL_MIN_ARGS};

use crate::core::models::{Configuration, ExecCommand};
use crate::error::{OrchestratorError, OrchestratorResult};
use tracing::{debug, warn};

/// Build the run configuration from the positional arguments, falling back
/// to `prompter` when fewer than [`POSITIONAL_MIN_ARGS`] were given
pub fn build_configuration(
    args: &[String],
    mode: &CommandMode,
    prompter: &mut dyn Prompter,
) -> OrchestratorResult<Configuration> {
    if args.len() >= POSITIONAL_MIN_ARGS {
        return positional_configuration(args);
    }
    if !args.is_empty() {
        warn!(given = args.len(), "too few positional arguments, switching to interactive mode");
    }
    let (count, index, command) = interactive::prompt_values(prompter, mode)?;
    debug!(count, index, %command, "interactive configuration");
    Configuration::new(count, index, command)
}

/// `process_count exec_index command...`, the command tail taken verbatim
pub fn positional_configuration(args: &[String]) -> OrchestratorResult<Configuration> {
    let [count, index, command @ ..] = args else {
        return Err(OrchestratorError::EmptyCommand);
    };
    let count = parse_count(count)?;
    let index = index
        .trim()
        .parse::<i64>()
        .map_err(|_| OrchestratorError::InvalidNumber {
            field: "exec index",
            value: index.clone(),
        })?;
    Configuration::new(count, index, ExecCommand::new(command.iter().cloned())?)
}

/// A count that parses only as a negative integer is a range error, not garbage
fn parse_count(raw: &str) -> OrchestratorResult<usize> {
    let trimmed = raw.trim();
    match trimmed.parse::<usize>() {
        Ok(count) => Ok(count),
        Err(_) if trimmed.parse::<i64>().is_ok() => Err(OrchestratorError::InvalidProcessCount),
        Err(_) => Err(OrchestratorError::InvalidNumber {
            field: "process count",
            value: raw.to_string(),
        }),
    }
}
