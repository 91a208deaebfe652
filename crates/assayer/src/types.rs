use serde::{Deserialize, Serialize};

/// Stderr text reported when the run phase exceeds its budget
pub const TIME_LIMIT_EXCEEDED_MESSAGE: &str = "Time Limit Exceeded";

/// Stderr text reported when the compiler exceeds its budget
pub const COMPILATION_TIMED_OUT_MESSAGE: &str = "Compilation timed out";

/// A single request to compile and run code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// Language ID (must be registered)
    pub language: String,

    /// Untrusted source text, written verbatim
    pub source_code: String,

    /// Data fed to the program's standard input
    #[serde(default)]
    pub stdin: String,

    /// Run-phase budget in seconds. `None` or zero uses the language default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source_code: source_code.into(),
            stdin: String::new(),
            timeout_seconds: None,
        }
    }

    /// Set the standard input
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Set the run-phase timeout in seconds
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

/// Result of an execution
///
/// Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Standard output, lossily decoded and trimmed
    pub stdout: String,

    /// Standard error, lossily decoded and trimmed
    pub stderr: String,

    /// Exit code of the last phase that ran (0 on success)
    pub exit_code: i32,

    /// Wall-clock milliseconds spent in compile and run
    pub execution_time_ms: u64,

    /// Coarse classification of the outcome
    pub status: ExecutionStatus,

    /// True only when the run phase was killed for exceeding its budget
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Check if the execution was successful
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Accepted
    }

    /// Result for a failure outside the submitted program (spawn, I/O, workspace)
    pub fn internal_error(message: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into().trim().to_owned(),
            exit_code: 1,
            execution_time_ms,
            status: ExecutionStatus::RuntimeError,
            timed_out: false,
        }
    }
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            execution_time_ms: 0,
            status: ExecutionStatus::Accepted,
            timed_out: false,
        }
    }
}

/// Status of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Program exited with code 0
    #[serde(rename = "Accepted")]
    Accepted,

    /// Program exited non-zero, or the engine could not run it
    #[serde(rename = "Runtime Error")]
    RuntimeError,

    /// Compiler exited non-zero
    #[serde(rename = "Compilation Error")]
    CompilationError,

    /// Run phase was killed at the deadline
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
}

impl ExecutionStatus {
    /// Classify a finished run phase
    pub fn classify(timed_out: bool, exit_code: i32) -> Self {
        if timed_out {
            ExecutionStatus::TimeLimitExceeded
        } else if exit_code != 0 {
            ExecutionStatus::RuntimeError
        } else {
            ExecutionStatus::Accepted
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Accepted => "Accepted",
            ExecutionStatus::RuntimeError => "Runtime Error",
            ExecutionStatus::CompilationError => "Compilation Error",
            ExecutionStatus::TimeLimitExceeded => "Time Limit Exceeded",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered language with the outcome of its availability probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    /// Language ID
    pub id: String,

    /// Display name
    pub name: String,

    /// First line printed by the version probe, or "Not available"
    pub version: String,

    /// Default run-phase timeout
    pub timeout_seconds: u64,

    /// Advisory memory limit
    pub memory_limit_mb: u64,

    /// Whether the version probe exited zero
    pub available: bool,
}

/// Decode process output, replacing invalid UTF-8 and trimming whitespace
pub fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_owned()
}
