//! Read-only lookup from language ID to toolchain
//!
//! The registry is built once from [`Config`] and never mutated, so it can be
//! shared freely between concurrent executions.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::config::{Config, Language};
use crate::sandbox::{ProcessCommand, ProcessOutcome, run_with_timeout};
use crate::types::LanguageInfo;

/// Version string reported for toolchains that fail the probe
pub const NOT_AVAILABLE: &str = "Not available";

/// Probes never need more than this much output
const PROBE_MAX_OUTPUT: usize = 64 * 1024;

/// Errors caused by the caller rather than by the submitted program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Registered languages keyed by ID
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, Language>,
    probe_timeout: Duration,
}

impl LanguageRegistry {
    /// Create a registry from `(id, language)` pairs
    pub fn new(
        languages: impl IntoIterator<Item = (String, Language)>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            languages: languages.into_iter().collect(),
            probe_timeout,
        }
    }

    /// Create a registry from the languages in a config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.languages.clone(), config.probe_timeout())
    }

    /// Look up a language by ID
    pub fn lookup(&self, id: &str) -> Result<&Language, RequestError> {
        self.languages
            .get(id)
            .ok_or_else(|| RequestError::UnsupportedLanguage(id.to_owned()))
    }

    /// Registered IDs in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Registered languages in ID order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Language)> {
        self.languages.iter().map(|(id, lang)| (id.as_str(), lang))
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// List every language together with a toolchain availability probe
    ///
    /// Probes run concurrently. A probe that cannot spawn, exits non-zero, or
    /// outlives the probe timeout marks the language unavailable.
    #[instrument(skip(self))]
    pub async fn list_available(&self) -> Vec<LanguageInfo> {
        let mut probes = JoinSet::new();
        for (id, lang) in &self.languages {
            let id = id.clone();
            let version = lang.version.clone();
            let timeout = self.probe_timeout;
            probes.spawn(async move { (id, probe_version(&version, timeout).await) });
        }

        let mut versions = BTreeMap::new();
        while let Some(joined) = probes.join_next().await {
            if let Ok((id, version)) = joined {
                versions.insert(id, version);
            }
        }

        self.languages
            .iter()
            .map(|(id, lang)| {
                let version = versions.remove(id).flatten();
                LanguageInfo {
                    id: id.clone(),
                    name: lang.name.clone(),
                    available: version.is_some(),
                    version: version.unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
                    timeout_seconds: lang.timeout_seconds,
                    memory_limit_mb: lang.memory_limit_mb,
                }
            })
            .collect()
    }
}

/// Run a version command and return the first line it prints
///
/// Returns `None` when the toolchain is unusable. Never fails.
pub async fn probe_version(command: &[String], timeout: Duration) -> Option<String> {
    if command.is_empty() {
        return None;
    }

    let outcome = run_with_timeout(&ProcessCommand::new(command), timeout, PROBE_MAX_OUTPUT).await;

    match outcome {
        Ok(ProcessOutcome::Exited(output)) if output.success() => {
            // Some toolchains print their banner on stderr
            let text = if output.stdout.iter().all(u8::is_ascii_whitespace) {
                output.stderr
            } else {
                output.stdout
            };
            let text = String::from_utf8_lossy(&text);
            Some(text.trim().lines().next().unwrap_or_default().trim().to_owned())
        }
        Ok(ProcessOutcome::Exited(output)) => {
            debug!(?command, exit_code = output.exit_code, "version probe failed");
            None
        }
        Ok(ProcessOutcome::TimedOut { .. }) => {
            debug!(?command, "version probe timed out");
            None
        }
        Err(e) => {
            debug!(?command, error = %e, "version probe could not run");
            None
        }
    }
}
