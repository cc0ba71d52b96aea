use colored::Colorize;
use forkgroup::commands::{
    build_configuration, Cli, CommandMode, LinePrompter, Prompter, TerminalPrompter,
};
use forkgroup::snapshot;
use forkgroup::utils::logger::init_logger;
use forkgroup::{Orchestrator, OrchestratorResult, Settings};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_command();

    if let Err(err) = init_logger(cli.log_level.as_deref(), None) {
        eprintln!("{} {}", "error:".red().bold(), err);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(category = err.category().display_name(), fatal = err.is_fatal(), "{}", err);
            eprintln!("{}", err.user_message().red());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> OrchestratorResult<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);

    let mode = if cli.shell {
        CommandMode::Shell {
            shell: settings.shell.clone(),
        }
    } else {
        CommandMode::Tokens
    };

    let mut prompter = prompter_for_stdin();
    let config = build_configuration(&cli.args, &mode, prompter.as_mut())?;

    let collaborator = snapshot::from_settings(&settings.snapshot, config.command());
    let summary = Orchestrator::new(&config, settings.timeline(), collaborator.as_ref()).run()?;
    tracing::debug!(?summary, "run complete");
    Ok(())
}

fn prompter_for_stdin() -> Box<dyn Prompter> {
    if io::stdin().is_terminal() && console::Term::stdout().is_term() {
        Box::new(TerminalPrompter)
    } else {
        Box::new(LinePrompter::new(io::stdin().lock(), io::stdout()))
    }
}
