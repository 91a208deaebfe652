//! Process and filesystem isolation primitives
//!
//! Every invocation gets its own scratch [`Workspace`] and runs its child
//! processes as leaders of fresh process groups, so that a timeout can take
//! down the whole tree. Both resources are released on every exit path.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::sandbox::command::ProcessCommand;
pub use crate::sandbox::process::{
    DEFAULT_MAX_OUTPUT_BYTES, ProcessGroup, ProcessOutcome, ProcessOutput, run_with_timeout,
};
pub use crate::sandbox::workspace::{WORKSPACE_PREFIX, Workspace};

mod command;
mod process;
mod workspace;

/// Errors that occur while preparing or driving a child process
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to create workspace under {root}: {source}")]
    WorkspaceCreate {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove workspace {path}: {source}")]
    WorkspaceCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty command")]
    EmptyCommand,

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Send SIGKILL to every process in the group led by `pid`
///
/// ESRCH after the group is gone is ignored.
#[cfg(unix)]
pub(crate) fn kill_process_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};

    if let Some(pgid) = group_id(pid) {
        let _ = killpg(pgid, Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
pub(crate) fn kill_process_group(_pid: u32) {}

/// Whether the group led by `pid` still has a member we may signal
#[cfg(unix)]
pub(crate) fn process_group_alive(pid: u32) -> bool {
    use nix::sys::signal::killpg;

    group_id(pid).is_some_and(|pgid| killpg(pgid, None).is_ok())
}

#[cfg(not(unix))]
pub(crate) fn process_group_alive(_pid: u32) -> bool {
    false
}

/// 0 and 1 would address our own group and init's
#[cfg(unix)]
fn group_id(pid: u32) -> Option<nix::unistd::Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|&pid| pid > 1)
        .map(nix::unistd::Pid::from_raw)
}
