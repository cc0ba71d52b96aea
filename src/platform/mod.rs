//! Thin wrappers over the Unix process-management calls

mod unix;

pub use unix::{
    current_pid, exec_program, exit_child, fork_process, kill_process, process_alive, reap,
    tie_to_parent,
};
