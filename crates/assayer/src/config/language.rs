use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;

const INVALID_FILE_EXT_CHARS: [char; 2] = ['/', '.'];

/// Stem of the source file written into every workspace
pub const DEFAULT_SOURCE_STEM: &str = "Solution";

/// Default wall-clock budget for the run phase, in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Advisory memory annotation reported to callers, in megabytes
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

/// Configuration for a programming language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name for the language (e.g., "C++")
    pub name: String,

    /// File extension
    pub extension: FileExtension,

    /// Stem of the source file name (e.g., "Solution" for `Solution.java`)
    #[serde(default = "default_source_stem")]
    pub source_stem: String,

    /// Compilation configuration (None for interpreted languages)
    #[serde(default)]
    pub compile: Option<CompileConfig>,

    /// Execution configuration
    pub run: RunConfig,

    /// Run-phase timeout used when the request does not set one
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Memory limit shown to callers. Not enforced.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    /// Command used to probe whether the toolchain is installed
    #[serde(default)]
    pub version: Vec<String>,
}

impl Language {
    /// Check if the language is compiled
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Get the source file name for this language
    pub fn source_name(&self) -> String {
        format!("{}.{}", self.source_stem, self.extension)
    }

    /// Resolve the toolchain variant with all placeholders expanded
    pub fn toolchain(&self) -> Toolchain {
        let source = self.source_name();

        let Some(ref compile) = self.compile else {
            let run = Self::expand_command(&self.run.command, &source, &source);
            return Toolchain::Interpreted { run };
        };

        match compile.output_name {
            Some(ref artifact) => Toolchain::FixedArtifact {
                compile: Self::expand_command(&compile.command, &source, artifact),
                run: Self::expand_command(&self.run.command, &source, artifact),
                artifact_file: compile.artifact_file_name(&source, artifact),
                artifact: artifact.clone(),
            },
            None => {
                let artifact = self.source_stem.clone();
                Toolchain::DerivedName {
                    compile: Self::expand_command(&compile.command, &source, &artifact),
                    run: Self::expand_command(&self.run.command, &source, &artifact),
                    artifact_file: compile.artifact_file_name(&source, &artifact),
                    artifact,
                }
            }
        }
    }

    /// Expand placeholders in the given command
    pub fn expand_command(command: &[String], source: &str, binary: &str) -> Vec<String> {
        command
            .iter()
            .map(|arg| Self::expand_placeholders(arg, source, binary))
            .collect()
    }

    /// Expand placeholders in a single argument
    pub fn expand_placeholders(arg: &str, source: &str, binary: &str) -> String {
        arg.replace("{source}", source)
            .replace("{output}", binary)
            .replace("{binary}", binary)
            .replace("{class}", binary)
    }
}

/// How a language turns source into a running program.
///
/// Every variant follows the same protocol: an optional compile step, then a
/// run step under the timeout guard. Commands are fully expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// Source is handed straight to an interpreter
    Interpreted { run: Vec<String> },

    /// Compiler writes an artifact with a fixed name (e.g., `solution`)
    FixedArtifact {
        compile: Vec<String>,
        artifact: String,
        artifact_file: String,
        run: Vec<String>,
    },

    /// Artifact name comes from the source file stem (e.g., Java class `Solution`)
    ///
    /// `artifact_file` is what the compiler actually writes (`Solution.class`).
    DerivedName {
        compile: Vec<String>,
        artifact: String,
        artifact_file: String,
        run: Vec<String>,
    },
}

impl Toolchain {
    pub fn compile_command(&self) -> Option<&[String]> {
        match self {
            Toolchain::Interpreted { .. } => None,
            Toolchain::FixedArtifact { compile, .. } | Toolchain::DerivedName { compile, .. } => {
                Some(compile)
            }
        }
    }

    pub fn run_command(&self) -> &[String] {
        match self {
            Toolchain::Interpreted { run }
            | Toolchain::FixedArtifact { run, .. }
            | Toolchain::DerivedName { run, .. } => run,
        }
    }

    /// Name of the compiled artifact as the run command refers to it, if any
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Toolchain::Interpreted { .. } => None,
            Toolchain::FixedArtifact { artifact, .. } | Toolchain::DerivedName { artifact, .. } => {
                Some(artifact)
            }
        }
    }

    /// File that must exist in the workspace after a successful compile
    pub fn artifact_file(&self) -> Option<&str> {
        match self {
            Toolchain::Interpreted { .. } => None,
            Toolchain::FixedArtifact { artifact_file, .. }
            | Toolchain::DerivedName { artifact_file, .. } => Some(artifact_file),
        }
    }
}

/// File extension without dot (e.g., "cpp")
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        let contains_invalid = extension
            .chars()
            .any(|c| INVALID_FILE_EXT_CHARS.contains(&c));
        if contains_invalid {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileExtension::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a file extension without '/' or '.' characters",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for the compilation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}, {output}, {binary}, {class}
    pub command: Vec<String>,

    /// Fixed artifact name. When absent the source stem is used.
    #[serde(default)]
    pub output_name: Option<String>,

    /// File the compiler writes, when it differs from the artifact name
    /// (e.g., `{class}.class`). Accepts the same placeholders as `command`.
    #[serde(default)]
    pub artifact_file: Option<String>,

    /// Environment variables to set during compilation
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl CompileConfig {
    /// Expanded name of the file the compiler is expected to produce
    pub fn artifact_file_name(&self, source: &str, artifact: &str) -> String {
        match self.artifact_file {
            Some(ref pattern) => Language::expand_placeholders(pattern, source, artifact),
            None => artifact.to_owned(),
        }
    }
}

/// Configuration for the execution step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}, {output}, {binary}, {class}
    pub command: Vec<String>,

    /// Environment variables to set
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_source_stem() -> String {
    DEFAULT_SOURCE_STEM.to_owned()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_memory_limit_mb() -> u64 {
    DEFAULT_MEMORY_LIMIT_MB
}
