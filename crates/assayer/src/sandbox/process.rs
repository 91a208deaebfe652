//! Process spawning with a wall-clock deadline
//!
//! Handles running a command to completion, capturing its output, and killing
//! its whole process group when the deadline passes first.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;
use tracing::{debug, instrument, warn};

use crate::sandbox::command::ProcessCommand;
use crate::sandbox::{SandboxError, kill_process_group, process_group_alive};

/// Default cap on captured bytes per stream (16 MB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

const READ_CHUNK: usize = 8192;

/// Captured result of a process that exited on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `128 + signal` if the process was killed by a signal
    pub exit_code: i32,

    /// Signal number if the process was killed by a signal
    pub signal: Option<i32>,

    /// Raw standard output (truncated at the capture cap)
    pub stdout: Vec<u8>,

    /// Raw standard error (truncated at the capture cap)
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// How a deadline-bounded process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited before the deadline
    Exited(ProcessOutput),

    /// The deadline passed; the process group was killed and output discarded
    TimedOut { exit_code: i32 },
}

/// A spawned child that leads its own process group
///
/// Dropping an unreaped group kills every process in it.
#[derive(Debug)]
pub struct ProcessGroup {
    child: Child,
    pid: Option<u32>,
    reaped: bool,
}

impl ProcessGroup {
    /// Spawn the command
    pub fn spawn(command: &ProcessCommand) -> Result<Self, SandboxError> {
        let program = command.program().unwrap_or_default().to_owned();
        let child = command
            .build()?
            .spawn()
            .map_err(|source| SandboxError::SpawnFailed { program, source })?;
        let pid = child.id();

        debug!(?pid, "spawned process group");

        Ok(Self {
            child,
            pid,
            reaped: false,
        })
    }

    /// Process ID of the group leader (also the group ID)
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Kill every process in the group
    ///
    /// Once the leader is reaped its ID stays reserved only while the group
    /// has members, so the group is signalled only if something still answers
    /// to it. The window between that check and the kill is not closed.
    pub fn kill(&mut self) {
        match self.pid {
            Some(pid) if self.reaped => {
                if process_group_alive(pid) {
                    debug!(pid, "killing stray members of process group");
                    kill_process_group(pid);
                }
            }
            Some(pid) => kill_process_group(pid),
            None => {
                let _ = self.child.start_kill();
            }
        }
    }

    /// Wait for the leader to exit and return its exit code
    async fn wait(&mut self) -> Result<(i32, Option<i32>), SandboxError> {
        let status = self.child.wait().await?;
        self.reaped = true;
        Ok(exit_code_of(status))
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.reaped {
            warn!(pid = ?self.pid, "process group dropped before exit, killing it");
            self.kill();
        }
    }
}

/// Map an exit status to `(exit_code, signal)`
fn exit_code_of(status: std::process::ExitStatus) -> (i32, Option<i32>) {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt as _;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal: Option<i32> = None;

    let exit_code = match status.code() {
        Some(code) => code,
        None => signal.map(|s| 128 + s).unwrap_or(1),
    };
    (exit_code, signal)
}

/// Read a stream to EOF, keeping at most `cap` bytes
///
/// Bytes past the cap are drained and dropped so the writer never blocks on
/// a full pipe.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(captured);
    };

    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(captured.len());
        captured.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok(captured)
}

/// Run a command to completion or until `timeout` elapses, whichever first
///
/// On timeout the whole process group is killed and reaped before this
/// returns, and any partial output is discarded.
///
/// When the leader exits first, the rest of its group is killed right away,
/// so a background descendant holding a pipe open cannot stall the readers
/// into a timeout. Output such a descendant would have written later is lost.
#[instrument(skip(command), fields(program = command.program().unwrap_or_default()))]
pub async fn run_with_timeout(
    command: &ProcessCommand,
    timeout: Duration,
    max_output: usize,
) -> Result<ProcessOutcome, SandboxError> {
    let mut group = ProcessGroup::spawn(command)?;

    let stdin = group.child.stdin.take();
    let stdout = group.child.stdout.take();
    let stderr = group.child.stderr.take();
    let input = command.stdin_data().unwrap_or_default().to_vec();

    let write_input = async move {
        if let Some(mut stdin) = stdin {
            if !input.is_empty() {
                // The program may exit without reading; a broken pipe is not our failure
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(error = %e, "stdin write stopped early");
                }
            }
            drop(stdin);
        }
    };

    let leader = async {
        let status = group.wait().await;
        if status.is_ok() {
            group.kill();
        }
        status
    };

    let completion = async {
        let (status, stdout, stderr, ()) = tokio::join!(
            leader,
            read_capped(stdout, max_output),
            read_capped(stderr, max_output),
            write_input,
        );
        Ok::<_, SandboxError>((status?, stdout?, stderr?))
    };

    let finished = tokio::time::timeout(timeout, completion).await;

    match finished {
        Ok(result) => {
            let ((exit_code, signal), stdout, stderr) = result?;

            debug!(exit_code, ?signal, "process exited");

            Ok(ProcessOutcome::Exited(ProcessOutput {
                exit_code,
                signal,
                stdout,
                stderr,
            }))
        }
        Err(_) => {
            debug!(?timeout, "deadline passed, killing process group");
            group.kill();
            let (exit_code, _) = group.wait().await?;
            Ok(ProcessOutcome::TimedOut { exit_code })
        }
    }
}
