//! Integration tests for assayer
//!
//! Most tests drive `sh`-based languages defined below and run on any Unix
//! host. Tests that need python3, g++, javac and node are behind a feature:
//!    cargo test -p assayer --features toolchain-tests

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use assayer::config::Config;
use assayer::runner::Runner;

mod execution;
#[cfg(feature = "toolchain-tests")]
mod toolchains;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Languages backed by `sh`, one per toolchain shape
pub(crate) const SHELL_LANGUAGES: &str = r#"
[languages.shell]
name = "Shell"
extension = "sh"
timeout_seconds = 5
version = ["sh", "-c", "echo sh 1.0"]

[languages.shell.run]
command = ["sh", "{source}"]

[languages.fixed]
name = "Checked Shell"
extension = "sh"
version = ["sh", "-c", "echo checked 1.0"]

[languages.fixed.compile]
command = ["sh", "-c", "sh -n {source} && cp {source} {binary}"]
output_name = "prog"

[languages.fixed.run]
command = ["sh", "{binary}"]

[languages.derived]
name = "Derived Shell"
extension = "sh"

[languages.derived.compile]
command = ["sh", "-c", "sh -n {source} && cp {source} {class}.class"]
artifact_file = "{class}.class"

[languages.derived.run]
command = ["sh", "{class}.class"]

[languages.classless]
name = "Classless Shell"
extension = "sh"

[languages.classless.compile]
command = ["sh", "-n", "{source}"]
artifact_file = "{class}.class"

[languages.classless.run]
command = ["sh", "{class}.class"]

[languages.native]
name = "Native Shell"
extension = "sh"

[languages.native.compile]
command = ["sh", "-c", "(echo '#!/bin/sh'; cat {source}) > {binary} && chmod +x {binary}"]
output_name = "solution"

[languages.native.run]
command = ["./{binary}"]

[languages.chatty]
name = "Chatty Compiler"
extension = "sh"

[languages.chatty.compile]
command = ["sh", "-c", "echo 'syntax error on stdout'; exit 2"]
output_name = "prog"

[languages.chatty.run]
command = ["sh", "{binary}"]

[languages.slowc]
name = "Slow Compiler"
extension = "sh"

[languages.slowc.compile]
command = ["sleep", "30"]
output_name = "prog"

[languages.slowc.run]
command = ["sh", "{binary}"]

[languages.ghost]
name = "Ghost"
extension = "gh"
version = ["assayer-no-such-binary", "--version"]

[languages.ghost.run]
command = ["assayer-no-such-binary", "{source}"]
"#;

/// Helper to get fixture file content
#[allow(dead_code)]
pub(crate) fn fixture_source(name: &str) -> String {
    let path = format!("{FIXTURES_PATH}/sources/{name}");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Create a test config with the shell languages and a private scratch root
pub(crate) fn test_config(scratch: &Path) -> Config {
    let mut config = Config::parse_toml(SHELL_LANGUAGES).expect("test languages should parse");
    config.scratch_dir = Some(scratch.to_path_buf());
    config
}

pub(crate) fn test_runner(scratch: &Path) -> Runner {
    Runner::new(test_config(scratch))
}

/// Entries left behind under a scratch root
pub(crate) fn leftover_entries(scratch: &Path) -> Vec<PathBuf> {
    match fs::read_dir(scratch) {
        Ok(entries) => entries.map(|entry| entry.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
