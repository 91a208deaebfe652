//! Tests against the default language set (python3, g++, javac, node)

use assayer::config::Config;
use assayer::runner::Runner;
use assayer::types::{ExecutionRequest, ExecutionResult, ExecutionStatus};

use super::fixture_source;

fn default_runner(scratch: &std::path::Path) -> Runner {
    let mut config = Config::default();
    config.scratch_dir = Some(scratch.to_path_buf());
    Runner::new(config)
}

async fn run(language: &str, fixture: &str, stdin: &str) -> ExecutionResult {
    let scratch = tempfile::tempdir().unwrap();
    let runner = default_runner(scratch.path());
    let request = ExecutionRequest::new(language, fixture_source(fixture)).with_stdin(stdin);
    let result = runner.execute(&request).await.unwrap();
    assert!(super::leftover_entries(scratch.path()).is_empty());
    result
}

#[tokio::test]
async fn test_all_default_toolchains_available() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = default_runner(scratch.path());

    for info in runner.list_languages().await {
        assert!(info.available, "{} is not available", info.id);
        assert_ne!(info.version, "");
    }
}

#[tokio::test]
async fn test_hello_world_every_language() {
    for (language, fixture) in [
        ("python", "hello.py"),
        ("cpp", "hello.cpp"),
        ("java", "Hello.java"),
        ("javascript", "hello.js"),
    ] {
        let result = run(language, fixture, "").await;
        assert_eq!(result.status, ExecutionStatus::Accepted, "{language}: {result:?}");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "Hello, World!");
    }
}

#[tokio::test]
async fn test_echo_stdin_every_language() {
    for (language, fixture) in [
        ("python", "echo.py"),
        ("cpp", "echo.cpp"),
        ("java", "Echo.java"),
        ("javascript", "echo.js"),
    ] {
        let result = run(language, fixture, "first\nsecond\n").await;
        assert_eq!(result.status, ExecutionStatus::Accepted, "{language}: {result:?}");
        assert_eq!(result.stdout, "first\nsecond");
    }
}

#[tokio::test]
async fn test_java_class_file_runs() {
    let result = run("java", "Hello.java", "").await;
    assert_eq!(result.status, ExecutionStatus::Accepted, "{result:?}");
    assert_eq!(result.stdout, "Hello, World!");
    assert!(!result.stderr.contains("not found"), "{}", result.stderr);
}

#[tokio::test]
async fn test_cpp_compile_error() {
    let result = run("cpp", "compile_error.cpp", "").await;
    assert_eq!(result.status, ExecutionStatus::CompilationError);
    assert!(result.stderr.contains("undefined_variable"));
    assert_eq!(result.stdout, "");
    assert_ne!(result.exit_code, 0);
}

#[tokio::test]
async fn test_java_compile_error() {
    let result = run("java", "CompileError.java", "").await;
    assert_eq!(result.status, ExecutionStatus::CompilationError);
    assert!(result.stderr.contains("incompatible types"));
}

#[tokio::test]
async fn test_python_syntax_error_is_runtime_error() {
    let result = run("python", "syntax_error.py", "").await;
    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert!(result.stderr.contains("SyntaxError"));
}

#[tokio::test]
async fn test_python_exit_code() {
    let result = run("python", "exit_code.py", "").await;
    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert_eq!(result.exit_code, 3);
}

#[tokio::test]
async fn test_javascript_uncaught_exception() {
    let result = run("javascript", "throws.js", "").await;
    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert!(result.stderr.contains("boom"));
}

#[tokio::test]
async fn test_cpp_infinite_loop_times_out() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = default_runner(scratch.path());
    let request =
        ExecutionRequest::new("cpp", fixture_source("infinite_loop.cpp")).with_timeout_seconds(1);

    let result = runner.execute(&request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::TimeLimitExceeded);
    assert!(result.timed_out);
    assert_eq!(result.stderr, "Time Limit Exceeded");
}
