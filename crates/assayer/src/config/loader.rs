//! Configuration file loading for Assayer
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "probe_timeout_seconds must be positive".to_owned(),
            ));
        }
        if self.compile_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "compile_timeout_seconds must be positive".to_owned(),
            ));
        }
        if self.max_output_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_output_bytes must be positive".to_owned(),
            ));
        }

        for (id, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty extension"
                )));
            }
            if !is_plain_file_name(&lang.source_stem) || lang.source_stem.contains('.') {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has invalid source stem '{}'",
                    lang.source_stem
                )));
            }
            if lang.run.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty run command"
                )));
            }
            if lang.timeout_seconds == 0 {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has zero timeout"
                )));
            }
            if let Some(ref compile) = lang.compile {
                if compile.command.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has empty compile command"
                    )));
                }
                if let Some(ref output) = compile.output_name
                    && !is_plain_file_name(output)
                {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has invalid output name '{output}'"
                    )));
                }
                if let Some(file) = lang.toolchain().artifact_file()
                    && !is_plain_file_name(file)
                {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has invalid artifact file '{file}'"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A non-empty name that stays inside the workspace
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}
