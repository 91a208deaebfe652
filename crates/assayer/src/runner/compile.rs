//! Compilation step for code execution
//!
//! Runs the language's compiler inside the workspace. The source file must
//! already be written.

use tracing::{debug, instrument};

use crate::config::{Config, Language, Toolchain};
use crate::runner::CompileError;
use crate::sandbox::{ProcessCommand, ProcessOutcome, Workspace, run_with_timeout};
use crate::types::decode_output;

/// Result of a compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Compiler exited zero; the artifact is ready to run
    Succeeded,

    /// Compiler exited non-zero
    Failed {
        exit_code: i32,
        /// Compiler diagnostics: stderr, or stdout if stderr was empty
        output: String,
    },

    /// Compiler was killed at the compile deadline
    TimedOut { exit_code: i32 },
}

impl CompileOutcome {
    /// Check if compilation was successful
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Succeeded)
    }
}

/// Compile the workspace's source file
///
/// The compiler gets no stdin and runs with the workspace as its working
/// directory, bounded by the configured compile timeout.
#[instrument(skip(workspace, config, language, toolchain), fields(workspace = workspace.id()))]
pub async fn compile(
    workspace: &Workspace,
    config: &Config,
    language: &Language,
    toolchain: &Toolchain,
) -> Result<CompileOutcome, CompileError> {
    let command = toolchain
        .compile_command()
        .ok_or_else(|| CompileError::NotCompiled(language.name.clone()))?;

    let mut process = ProcessCommand::new(command).working_dir(workspace.path());
    if let Some(ref compile_config) = language.compile {
        process = process.envs(compile_config.env.iter());
    }

    debug!(?command, "running compiler");

    let outcome =
        run_with_timeout(&process, config.compile_timeout(), config.max_output_bytes).await?;

    let output = match outcome {
        ProcessOutcome::Exited(output) => output,
        ProcessOutcome::TimedOut { exit_code } => {
            debug!(timeout = ?config.compile_timeout(), "compilation timed out");
            return Ok(CompileOutcome::TimedOut { exit_code });
        }
    };

    debug!(exit_code = output.exit_code, "compilation complete");

    if output.success() {
        return Ok(CompileOutcome::Succeeded);
    }

    // Some compilers report diagnostics on stdout
    let mut diagnostics = decode_output(&output.stderr);
    if diagnostics.is_empty() {
        diagnostics = decode_output(&output.stdout);
    }

    Ok(CompileOutcome::Failed {
        exit_code: output.exit_code,
        output: diagnostics,
    })
}
