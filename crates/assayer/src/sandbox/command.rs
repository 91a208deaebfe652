//! Command builder for child processes
//!
//! Builds a [`tokio::process::Command`] that runs in its own process group
//! with captured output, so that the whole tree can be killed at once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::sandbox::SandboxError;

/// Builder for a captured child process
#[derive(Debug, Clone, Default)]
pub struct ProcessCommand {
    /// Program followed by its arguments
    command: Vec<String>,
    /// Directory the child starts in
    working_dir: Option<PathBuf>,
    /// Extra environment variables
    env: HashMap<String, String>,
    /// Data for stdin; `None` attaches /dev/null
    stdin: Option<Vec<u8>>,
}

impl ProcessCommand {
    /// Create a builder for the given program and arguments
    pub fn new(command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables
    pub fn envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Pipe the given bytes to stdin. An empty buffer closes stdin immediately.
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// The program name, if any
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Full argument vector including the program
    pub fn args(&self) -> &[String] {
        &self.command
    }

    pub(crate) fn stdin_data(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    /// Resolve the program path against the working directory.
    ///
    /// Relative paths with a `/` (like `./solution`) are joined onto the
    /// working directory so they do not depend on the parent's cwd. Bare
    /// names are left for PATH lookup.
    fn resolved_program(&self) -> Result<PathBuf, SandboxError> {
        let program = self.program().ok_or(SandboxError::EmptyCommand)?;
        let path = Path::new(program);

        match self.working_dir {
            Some(ref dir) if program.contains('/') && path.is_relative() => Ok(dir.join(path)),
            _ => Ok(PathBuf::from(program)),
        }
    }

    /// Build the tokio command
    ///
    /// stdout and stderr are piped, the child leads a new process group, and
    /// the child is killed if the handle is dropped before it is reaped.
    pub(crate) fn build(&self) -> Result<Command, SandboxError> {
        let program = self.resolved_program()?;

        let mut cmd = Command::new(program);
        cmd.args(&self.command[1..])
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(&self.env)
            .kill_on_drop(true);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        Ok(cmd)
    }
}
