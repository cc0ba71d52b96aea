//! Interactive prompts for the configuration values
//!
//! On a terminal the prompts go through dialoguer and re-ask on bad input.
//! Otherwise the answers are read line by line and bad input is an error.

use crate::config::{MAX_COMMAND_TOKENS, TIME_SUBSTITUTE, TIME_TOKEN};
use crate::core::models::{validate_exec_index, ExecCommand};
use crate::error::{OrchestratorError, OrchestratorResult};
use dialoguer::Input;
use std::io::{BufRead, Write};

pub const COUNT_PROMPT: &str = "Enter the number of child processes";
pub const COMMAND_PROMPT: &str =
    "Enter the command to run via exec (e.g., one of: ls, ps aux, pwd, whoami, df, date, time):";

pub fn index_prompt(process_count: usize) -> String {
    format!(
        "Enter the index of the process that will run exec (from 0 to {})",
        process_count as i64 - 1
    )
}

/// How the free-form interactive line becomes an argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMode {
    /// Split on whitespace, at most [`MAX_COMMAND_TOKENS`] tokens
    Tokens,
    /// `{shell, "-c", line}`
    Shell { shell: String },
}

/// Source of interactive answers
pub trait Prompter {
    /// Ask for an integer; `validate` decides whether it is acceptable
    fn ask_number(
        &mut self,
        prompt: &str,
        field: &'static str,
        validate: &dyn Fn(i64) -> OrchestratorResult<()>,
    ) -> OrchestratorResult<i64>;

    fn ask_line(&mut self, prompt: &str) -> OrchestratorResult<String>;
}

/// dialoguer-backed prompts for an attended terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask_number(
        &mut self,
        prompt: &str,
        field: &'static str,
        validate: &dyn Fn(i64) -> OrchestratorResult<()>,
    ) -> OrchestratorResult<i64> {
        let input: String = Input::new()
            .with_prompt(prompt)
            .validate_with(|val: &String| -> Result<(), String> {
                let number = parse_number(field, val).map_err(|e| e.to_string())?;
                validate(number).map_err(|e| e.to_string())
            })
            .interact_text()?;
        parse_number(field, &input)
    }

    fn ask_line(&mut self, prompt: &str) -> OrchestratorResult<String> {
        println!("{prompt}");
        let input: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;
        Ok(input)
    }
}

/// Plain line-oriented prompts for pipes and redirected stdin
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_line(&mut self) -> OrchestratorResult<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(OrchestratorError::Prompt(
                "unexpected end of input".to_string(),
            ));
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask_number(
        &mut self,
        prompt: &str,
        field: &'static str,
        validate: &dyn Fn(i64) -> OrchestratorResult<()>,
    ) -> OrchestratorResult<i64> {
        write!(self.writer, "{prompt}: ")?;
        self.writer.flush()?;
        let number = parse_number(field, &self.read_line()?)?;
        validate(number)?;
        Ok(number)
    }

    fn ask_line(&mut self, prompt: &str) -> OrchestratorResult<String> {
        write!(self.writer, "{prompt}\n> ")?;
        self.writer.flush()?;
        self.read_line()
    }
}

fn parse_number(field: &'static str, raw: &str) -> OrchestratorResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| OrchestratorError::InvalidNumber {
            field,
            value: raw.trim().to_string(),
        })
}

/// Ask for count, exec slot and command
pub fn prompt_values(
    prompter: &mut dyn Prompter,
    mode: &CommandMode,
) -> OrchestratorResult<(usize, i64, ExecCommand)> {
    let count = prompter.ask_number(COUNT_PROMPT, "process count", &|n| {
        if n >= 1 {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidProcessCount)
        }
    })?;
    let count = count as usize;

    let index = prompter.ask_number(&index_prompt(count), "exec index", &|i| {
        validate_exec_index(i, count).map(|_| ())
    })?;

    let line = prompter.ask_line(COMMAND_PROMPT)?;
    Ok((count, index, interactive_command(&line, mode)?))
}

/// Turn one interactive line into the exec argument vector
pub fn interactive_command(line: &str, mode: &CommandMode) -> OrchestratorResult<ExecCommand> {
    let line = rewrite_time(line.trim());
    if line.is_empty() {
        return Err(OrchestratorError::EmptyCommand);
    }
    match mode {
        CommandMode::Shell { shell } => ExecCommand::new([shell.clone(), "-c".to_string(), line]),
        CommandMode::Tokens => ExecCommand::new(tokenize(&line, MAX_COMMAND_TOKENS)?),
    }
}

/// A bare `time` has nothing to time; replace it with a no-op
pub fn rewrite_time(line: &str) -> String {
    if line == TIME_TOKEN {
        TIME_SUBSTITUTE.to_string()
    } else {
        line.to_string()
    }
}

/// Whitespace split with a hard capacity; no quoting or escaping
pub fn tokenize(line: &str, capacity: usize) -> OrchestratorResult<Vec<String>> {
    let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if tokens.len() > capacity {
        return Err(OrchestratorError::TooManyTokens {
            count: tokens.len(),
            capacity,
        });
    }
    Ok(tokens)
}
