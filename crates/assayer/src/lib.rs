//! A library for running untrusted code submissions.
//!
//! Assayer accepts source code in one of several configured languages,
//! compiles it if needed, runs it against supplied standard input under a
//! wall-clock budget, and reports captured output with a coarse verdict.
//!
//! # Features
//!
//! - **Scoped workspaces**: each request gets its own scratch directory, removed on every exit path.
//! - **Process-group timeouts**: a program that exceeds its budget is killed along with its descendants.
//! - **Multi-language**: interpreted languages, compiled languages with fixed artifact names, and
//!   compiled languages whose artifact name derives from the source file.
//! - **TOML configuration**: per-language compile and run commands.
//!
//! # Example
//!
//! ```no_run
//! use assayer::{ExecutionRequest, Runner};
//!
//! # async fn demo() -> Result<(), assayer::RequestError> {
//! let runner = Runner::with_defaults();
//! let result = runner
//!     .execute(&ExecutionRequest::new("python", "print(input())").with_stdin("hi"))
//!     .await?;
//! assert_eq!(result.stdout, "hi");
//! # Ok(())
//! # }
//! ```

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language, Toolchain};
pub use registry::{LanguageRegistry, RequestError};
pub use runner::{
    CompileAndRunError, CompileError, CompileOutcome, ExecuteError, ExecutionObserver, Phase,
    PhaseSummary, RunOutcome, Runner, TracingObserver,
};
pub use sandbox::{SandboxError, Workspace};
pub use types::{ExecutionRequest, ExecutionResult, ExecutionStatus, LanguageInfo};

pub mod config;
pub mod registry;
pub mod runner;
pub mod sandbox;
pub mod types;
