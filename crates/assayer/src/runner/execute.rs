//! Execution step for code running
//!
//! Handles running compiled or interpreted programs under the run-phase
//! deadline.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::config::{Config, Language, Toolchain};
use crate::runner::ExecuteError;
use crate::sandbox::{ProcessCommand, ProcessOutcome, Workspace, run_with_timeout};
use crate::types::decode_output;

/// How the run phase ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Program exited before the deadline
    Completed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// Program was killed at the deadline; its output was discarded
    TimedOut { exit_code: i32 },
}

/// Run the program in a workspace with batch I/O
///
/// The source (and, for compiled toolchains, the artifact) must already be in
/// the workspace. `stdin` is always piped; an empty buffer gives the program
/// immediate EOF.
#[instrument(skip(workspace, config, language, toolchain, stdin), fields(workspace = workspace.id()))]
pub async fn execute(
    workspace: &Workspace,
    config: &Config,
    language: &Language,
    toolchain: &Toolchain,
    stdin: &[u8],
    timeout: Duration,
) -> Result<RunOutcome, ExecuteError> {
    match toolchain.artifact_file() {
        Some(artifact_file) => {
            if !workspace.file_exists(artifact_file).await? {
                return Err(ExecuteError::NotStarted(format!(
                    "artifact '{artifact_file}' not found in workspace - was compilation run?"
                )));
            }
        }
        None => {
            let source_name = language.source_name();
            if !workspace.file_exists(&source_name).await? {
                return Err(ExecuteError::NotStarted(format!(
                    "source '{source_name}' not found in workspace - write source first"
                )));
            }
        }
    }

    let run_cmd = toolchain.run_command();
    debug!(?run_cmd, "executing program");

    let command = ProcessCommand::new(run_cmd)
        .working_dir(workspace.path())
        .envs(language.run.env.iter())
        .stdin(stdin);

    let outcome = run_with_timeout(&command, timeout, config.max_output_bytes).await?;

    let outcome = match outcome {
        ProcessOutcome::Exited(output) => RunOutcome::Completed {
            exit_code: output.exit_code,
            stdout: decode_output(&output.stdout),
            stderr: decode_output(&output.stderr),
        },
        ProcessOutcome::TimedOut { exit_code } => RunOutcome::TimedOut { exit_code },
    };

    debug!(?outcome, "execution complete");

    Ok(outcome)
}
