use crate::config::Timeline;
use crate::core::models::{ChildRegistry, ChildRole, Configuration};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::platform;
use crate::snapshot::{SnapshotCollaborator, SnapshotLabel};
use nix::sys::wait::WaitStatus;
use nix::unistd::{ForkResult, Pid};
use std::ffi::CString;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Counts and pids of one complete run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub exec_index: usize,
    pub pids: Vec<Pid>,
    pub spawned: usize,
    pub terminated: usize,
    pub reaped: usize,
}

impl RunSummary {
    /// Same event counts and exec slot, ignoring the concrete pids
    pub fn same_shape(&self, other: &RunSummary) -> bool {
        self.exec_index == other.exec_index
            && self.spawned == other.spawned
            && self.terminated == other.terminated
            && self.reaped == other.reaped
    }
}

/// Outcome of the signal-all-then-wait-all phase
#[derive(Debug, Default)]
pub struct ReapReport {
    pub signalled: usize,
    pub reaped: Vec<(Pid, WaitStatus)>,
    pub errors: Vec<OrchestratorError>,
}

/// Drives one process group through spawn, observe, terminate and reap
pub struct Orchestrator<'a> {
    config: &'a Configuration,
    timeline: Timeline,
    snapshot: &'a dyn SnapshotCollaborator,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Configuration,
        timeline: Timeline,
        snapshot: &'a dyn SnapshotCollaborator,
    ) -> Self {
        Self {
            config,
            timeline,
            snapshot,
        }
    }

    pub fn run(&self) -> OrchestratorResult<RunSummary> {
        info!(
            process_count = self.config.process_count(),
            exec_index = self.config.exec_index(),
            command = %self.config.command(),
            "spawning process group"
        );
        let registry = spawn_group(self.config, self.timeline.report_interval)?;

        thread::sleep(self.timeline.snapshot_delay);
        self.snapshot.capture(SnapshotLabel::Start);

        thread::sleep(self.timeline.termination_delay);
        let report = terminate_and_reap(&registry);
        for err in &report.errors {
            warn!("{}", err);
        }

        self.snapshot.capture(SnapshotLabel::End);
        println!("Parent process finished.");

        Ok(RunSummary {
            exec_index: self.config.exec_index(),
            pids: registry.pids().to_vec(),
            spawned: registry.len(),
            terminated: report.signalled,
            reaped: report.reaped.len(),
        })
    }
}

/// Fork every child of the group in index order
pub fn spawn_group(config: &Configuration, report_interval: Duration) -> OrchestratorResult<ChildRegistry> {
    spawn_group_with(config, report_interval, platform::fork_process)
}

/// [`spawn_group`] with an injectable fork, so partial-failure rollback can be exercised
pub fn spawn_group_with<F>(
    config: &Configuration,
    report_interval: Duration,
    mut fork: F,
) -> OrchestratorResult<ChildRegistry>
where
    F: FnMut() -> nix::Result<ForkResult>,
{
    // Converted before any fork so the exec child goes straight to execvp.
    let argv = config.command().to_cstrings()?;
    let mut registry = ChildRegistry::try_with_capacity(config.process_count())?;
    let parent = platform::current_pid();

    for index in 0..config.process_count() {
        match fork() {
            Ok(ForkResult::Child) => {
                platform::tie_to_parent(parent);
                match config.role_of(index) {
                    ChildRole::Exec => exec_transition(&argv),
                    ChildRole::Reporter => reporting_loop(index, report_interval),
                }
            }
            Ok(ForkResult::Parent { child }) => {
                registry.record(child);
                debug!(index, pid = %child, role = ?config.role_of(index), "spawned child");
            }
            Err(source) => {
                error!(index, error = %source, "fork failed, rolling back {} children", registry.len());
                let report = terminate_and_reap(&registry);
                for err in &report.errors {
                    warn!("rollback: {}", err);
                }
                return Err(OrchestratorError::SpawnFailed { index, source });
            }
        }
    }

    Ok(registry)
}

/// Child side of a non-exec slot; ends only when the process is killed
fn reporting_loop(index: usize, interval: Duration) -> ! {
    let pid = platform::current_pid();
    let mut stdout = io::stdout();
    loop {
        // Write errors are ignored: a child must never unwind into the parent's code.
        let _ = writeln!(stdout, "Child #{index} (PID {pid}) is running...");
        let _ = stdout.flush();
        thread::sleep(interval);
    }
}

/// Child side of the exec slot
fn exec_transition(argv: &[CString]) -> ! {
    let errno = platform::exec_program(argv);
    let _ = writeln!(io::stderr(), "exec failed: {errno}");
    platform::exit_child(libc::EXIT_FAILURE)
}

/// Send SIGKILL to every registered child, in index order
pub fn terminate_group(registry: &ChildRegistry, report: &mut ReapReport) {
    for (index, pid) in registry.iter() {
        match platform::kill_process(pid) {
            Ok(()) => {
                report.signalled += 1;
                println!("Terminated child with PID {pid}");
            }
            Err(source) => {
                debug!(index, %pid, error = %source, "kill failed");
                report.errors.push(OrchestratorError::Signal { pid, source });
            }
        }
    }
}

/// Wait on every registered child, in index order
pub fn reap_group(registry: &ChildRegistry, report: &mut ReapReport) {
    for (index, pid) in registry.iter() {
        match platform::reap(pid) {
            Ok(status) => {
                debug!(index, %pid, ?status, "reaped child");
                report.reaped.push((pid, status));
            }
            Err(source) => report.errors.push(OrchestratorError::Reap { pid, source }),
        }
    }
}

/// Signal all children first, then reap all of them
pub fn terminate_and_reap(registry: &ChildRegistry) -> ReapReport {
    let mut report = ReapReport::default();
    terminate_group(registry, &mut report);
    reap_group(registry, &mut report);
    info!(
        signalled = report.signalled,
        reaped = report.reaped.len(),
        "process group terminated"
    );
    report
}
