use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::sandbox::DEFAULT_MAX_OUTPUT_BYTES;

pub use crate::config::language::{
    CompileConfig, DEFAULT_MEMORY_LIMIT_MB, DEFAULT_SOURCE_STEM, DEFAULT_TIMEOUT_SECONDS,
    FileExtension, Language, RunConfig, Toolchain,
};

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../assayer.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Assayer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory for per-invocation workspaces (system temp dir if unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Timeout for toolchain version probes
    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,

    /// Upper bound on a single compiler invocation
    #[serde(default = "default_compile_timeout_seconds")]
    pub compile_timeout_seconds: u64,

    /// Cap on captured bytes per output stream
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Language configurations keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create a new config with embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            scratch_dir: None,
            probe_timeout_seconds: default_probe_timeout_seconds(),
            compile_timeout_seconds: default_compile_timeout_seconds(),
            max_output_bytes: default_max_output_bytes(),
            languages: HashMap::new(),
        }
    }

    /// Get a language by ID
    pub fn get_language(&self, id: &str) -> Result<&Language, ConfigError> {
        self.languages
            .get(id)
            .ok_or_else(|| ConfigError::LanguageNotFound(id.to_string()))
    }

    /// Directory under which workspaces are created
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_probe_timeout_seconds() -> u64 {
    5
}

fn default_compile_timeout_seconds() -> u64 {
    60
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}
