//! Telemetry hooks for the execution pipeline

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::sandbox::SandboxError;

/// Pipeline phase reported to an [`ExecutionObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Compile,
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Compile => f.write_str("compile"),
            Phase::Run => f.write_str("run"),
        }
    }
}

/// Summary of a finished phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSummary {
    /// Exit code of the phase's process
    pub exit_code: i32,

    /// Whether the phase was killed at its deadline
    pub timed_out: bool,

    /// Wall-clock time spent in the phase
    pub elapsed: Duration,
}

/// Receives workspace and phase events from a [`Runner`](crate::Runner)
///
/// All methods default to doing nothing. Implementations are called from
/// concurrent executions and must not block.
pub trait ExecutionObserver: Send + Sync + fmt::Debug {
    /// A workspace directory was created
    fn workspace_created(&self, _id: &str, _path: &Path) {}

    /// A workspace directory was removed, or removal failed with `error`
    fn workspace_released(&self, _id: &str, _path: &Path, _error: Option<&SandboxError>) {}

    /// A compile or run phase finished
    fn phase_finished(&self, _phase: Phase, _summary: &PhaseSummary) {}
}

/// Observer that forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn workspace_created(&self, id: &str, path: &Path) {
        debug!(workspace = id, ?path, "workspace acquired");
    }

    fn workspace_released(&self, id: &str, path: &Path, error: Option<&SandboxError>) {
        match error {
            None => debug!(workspace = id, ?path, "workspace released"),
            Some(e) => warn!(workspace = id, ?path, error = %e, "workspace release failed"),
        }
    }

    fn phase_finished(&self, phase: Phase, summary: &PhaseSummary) {
        info!(
            %phase,
            exit_code = summary.exit_code,
            timed_out = summary.timed_out,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "phase finished"
        );
    }
}
