use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};
use std::ffi::CString;
use std::io::{self, Write};
use tracing::debug;

/// Duplicate the calling process
///
/// Standard output is flushed first so the child never inherits and replays
/// buffered parent output.
pub fn fork_process() -> nix::Result<ForkResult> {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    // SAFETY: children produced here only print, sleep, exec or `_exit`; they
    // never return into code that relies on state owned by other threads.
    unsafe { fork() }
}

/// Replace the current image; only returns on failure
pub fn exec_program(argv: &[CString]) -> Errno {
    match argv.first() {
        Some(program) => match execvp(program, argv) {
            Ok(never) => match never {},
            Err(errno) => errno,
        },
        None => Errno::EINVAL,
    }
}

/// Leave a forked child without running the parent's exit handlers
pub fn exit_child(code: i32) -> ! {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    // SAFETY: `_exit` skips atexit handlers and destructors inherited from the
    // parent; the child owns nothing that needs them.
    unsafe { libc::_exit(code) }
}

/// Make the calling child die with the process that forked it
///
/// Linux only; elsewhere an orphaned child keeps running until killed.
/// The kernel fires the signal when the forking *thread* exits, so a library
/// caller that spawns from a short-lived thread loses its children with it.
pub fn tie_to_parent(parent: Pid) {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: prctl with PR_SET_PDEATHSIG only sets a flag on this process.
        let result = unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) };
        if result != 0 {
            return;
        }
        // The parent may have exited before the flag was set.
        if nix::unistd::getppid() != parent {
            exit_child(libc::EXIT_FAILURE);
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = parent;
}

/// Deliver the non-catchable kill signal
pub fn kill_process(pid: Pid) -> nix::Result<()> {
    kill(pid, Signal::SIGKILL)?;
    debug!(%pid, "sent SIGKILL");
    Ok(())
}

/// Block until `pid` has fully exited, retrying interrupted waits
pub fn reap(pid: Pid) -> nix::Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// Check if process is alive
///
/// A zombie still counts as alive until it is reaped.
pub fn process_alive(pid: Pid) -> bool {
    match kill(pid, None) {
        Ok(()) => true,
        Err(errno) => errno == Errno::EPERM, // EPERM means process exists but no permission
    }
}

pub fn current_pid() -> Pid {
    nix::unistd::getpid()
}
