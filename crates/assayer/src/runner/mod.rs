//! Execution coordinator
//!
//! Drives one request through workspace acquisition, the optional compile
//! phase, the deadline-bounded run phase and workspace release.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, instrument, warn};

pub use crate::runner::compile::{CompileOutcome, compile};
pub use crate::runner::execute::{RunOutcome, execute};
pub use crate::runner::observer::{ExecutionObserver, Phase, PhaseSummary, TracingObserver};

mod compile;
mod execute;
mod observer;

use crate::{
    config::{Config, Language},
    registry::{LanguageRegistry, RequestError},
    sandbox::{SandboxError, Workspace},
    types::{
        COMPILATION_TIMED_OUT_MESSAGE, ExecutionRequest, ExecutionResult, ExecutionStatus,
        LanguageInfo, TIME_LIMIT_EXCEEDED_MESSAGE,
    },
};

/// Errors that occur during compilation
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("language '{0}' does not support compilation")]
    NotCompiled(String),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

/// Errors that occur during execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("execution not started: {0}")]
    NotStarted(String),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

/// Errors that occur during compile-and-run operations
///
/// Every variant is folded into a `Runtime Error` result by
/// [`Runner::execute`]; none of them reach the caller.
#[derive(Debug, Error)]
pub enum CompileAndRunError {
    /// Error preparing the workspace
    #[error(transparent)]
    Workspace(#[from] SandboxError),

    /// Error during compilation phase
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Error during execution phase (compilation succeeded)
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// High-level runner for code execution
///
/// Cloning is cheap; clones share the configuration, registry and observer.
/// Concurrent calls to [`execute`](Self::execute) are independent.
#[derive(Debug, Clone)]
pub struct Runner {
    config: Arc<Config>,
    registry: Arc<LanguageRegistry>,
    observer: Arc<dyn ExecutionObserver>,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Create a new runner that reports events to `observer`
    pub fn with_observer(config: Config, observer: Arc<dyn ExecutionObserver>) -> Self {
        let registry = LanguageRegistry::from_config(&config);
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            observer,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the language registry
    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// List registered languages with availability probes
    pub async fn list_languages(&self) -> Vec<LanguageInfo> {
        self.registry.list_available().await
    }

    /// Compile (if needed) and run a submission
    ///
    /// Only an unknown language ID fails the call. Every other failure,
    /// including workspace and spawn errors, is reported as a `Runtime Error`
    /// result. The workspace is removed before this returns.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, RequestError> {
        let language = self.registry.lookup(&request.language)?;

        let workspace = match Workspace::create(&self.config.scratch_root()).await {
            Ok(workspace) => workspace,
            Err(e) => {
                warn!(error = %e, "could not acquire workspace");
                return Ok(ExecutionResult::internal_error(e.to_string(), 0));
            }
        };
        self.observer
            .workspace_created(workspace.id(), workspace.path());

        let started = Instant::now();
        let result = match self
            .compile_and_run(&workspace, language, request, started)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "execution failed");
                ExecutionResult::internal_error(e.to_string(), elapsed_ms(started))
            }
        };

        let id = workspace.id().to_owned();
        let path = workspace.path().to_path_buf();
        let released = workspace.close().await;
        self.observer
            .workspace_released(&id, &path, released.as_ref().err());

        debug!(status = %result.status, exit_code = result.exit_code, "request finished");

        Ok(result)
    }

    /// Effective run-phase budget for a request
    pub fn run_timeout(&self, language: &Language, request: &ExecutionRequest) -> Duration {
        let seconds = match request.timeout_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => language.timeout_seconds,
        };
        Duration::from_secs(seconds)
    }

    /// Write the source, compile it if the toolchain needs it, then run it
    async fn compile_and_run(
        &self,
        workspace: &Workspace,
        language: &Language,
        request: &ExecutionRequest,
        started: Instant,
    ) -> Result<ExecutionResult, CompileAndRunError> {
        let toolchain = language.toolchain();

        workspace
            .write_file(&language.source_name(), request.source_code.as_bytes())
            .await?;

        if toolchain.compile_command().is_some() {
            let phase_started = Instant::now();
            let outcome = compile(workspace, &self.config, language, &toolchain).await?;

            let (exit_code, timed_out) = match outcome {
                CompileOutcome::Succeeded => (0, false),
                CompileOutcome::Failed { exit_code, .. } => (exit_code, false),
                CompileOutcome::TimedOut { exit_code } => (exit_code, true),
            };
            self.observer.phase_finished(
                Phase::Compile,
                &PhaseSummary {
                    exit_code,
                    timed_out,
                    elapsed: phase_started.elapsed(),
                },
            );

            let stderr = match outcome {
                CompileOutcome::Succeeded => None,
                CompileOutcome::Failed { output, .. } => Some(output),
                CompileOutcome::TimedOut { .. } => Some(COMPILATION_TIMED_OUT_MESSAGE.to_owned()),
            };
            if let Some(stderr) = stderr {
                return Ok(ExecutionResult {
                    stdout: String::new(),
                    stderr,
                    exit_code,
                    execution_time_ms: elapsed_ms(started),
                    status: ExecutionStatus::CompilationError,
                    timed_out: false,
                });
            }
        }

        let timeout = self.run_timeout(language, request);
        let phase_started = Instant::now();
        let outcome = execute(
            workspace,
            &self.config,
            language,
            &toolchain,
            request.stdin.as_bytes(),
            timeout,
        )
        .await?;

        let (stdout, stderr, exit_code, timed_out) = match outcome {
            RunOutcome::Completed {
                exit_code,
                stdout,
                stderr,
            } => (stdout, stderr, exit_code, false),
            RunOutcome::TimedOut { exit_code } => (
                String::new(),
                TIME_LIMIT_EXCEEDED_MESSAGE.to_owned(),
                exit_code,
                true,
            ),
        };
        self.observer.phase_finished(
            Phase::Run,
            &PhaseSummary {
                exit_code,
                timed_out,
                elapsed: phase_started.elapsed(),
            },
        );

        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_code,
            execution_time_ms: elapsed_ms(started),
            status: ExecutionStatus::classify(timed_out, exit_code),
            timed_out,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
