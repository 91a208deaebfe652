use std::time::{Duration, Instant};

use assayer::types::{ExecutionRequest, ExecutionStatus};

use super::test_runner;

#[tokio::test]
async fn test_run_hello_world() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "echo 'Hello, World!'"))
        .await
        .expect("shell is registered");

    assert!(result.is_success());
    assert_eq!(result.status, ExecutionStatus::Accepted);
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "Hello, World!");
    assert_eq!(result.stderr, "");
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_run_with_stdin() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let request = ExecutionRequest::new("shell", "read line\necho \"$line\"").with_stdin("hello");
    let result = runner.execute(&request).await.unwrap();

    assert_eq!(result.status, ExecutionStatus::Accepted);
    assert_eq!(result.stdout, "hello");
}

#[tokio::test]
async fn test_multiline_stdin_is_passed_verbatim() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let request = ExecutionRequest::new("shell", "cat").with_stdin("1 2\n3 4\n");
    let result = runner.execute(&request).await.unwrap();

    assert_eq!(result.stdout, "1 2\n3 4");
}

#[tokio::test]
async fn test_empty_stdin_is_immediate_eof() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "cat\necho done"))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::Accepted);
    assert_eq!(result.stdout, "done");
}

#[tokio::test]
async fn test_explicit_exit_code_is_runtime_error() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "echo before\nexit 3"))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stdout, "before");
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_stderr_is_captured_separately() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "echo out\necho oops >&2\nexit 1"))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert_eq!(result.stdout, "out");
    assert_eq!(result.stderr, "oops");
}

#[tokio::test]
async fn test_output_is_trimmed() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "printf '\\n  padded  \\n\\n'"))
        .await
        .unwrap();

    assert_eq!(result.stdout, "padded");
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "printf '\\377\\376ok'"))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::Accepted);
    assert!(result.stdout.ends_with("ok"));
    assert!(result.stdout.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_signal_exit_code() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "kill -9 $$"))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert_eq!(result.exit_code, 128 + 9);
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_infinite_loop_times_out() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let started = Instant::now();
    let result = runner
        .execute(
            &ExecutionRequest::new("shell", "echo partial\nwhile :; do :; done")
                .with_timeout_seconds(1),
        )
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::TimeLimitExceeded);
    assert!(result.timed_out);
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "Time Limit Exceeded");
    assert!(result.execution_time_ms >= 1000);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_sleeping_program_times_out() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let started = Instant::now();
    let result = runner
        .execute(&ExecutionRequest::new("shell", "sleep 30").with_timeout_seconds(1))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::TimeLimitExceeded);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_zero_timeout_uses_language_default() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "sleep 1\necho awake").with_timeout_seconds(0))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::Accepted);
    assert_eq!(result.stdout, "awake");
}

#[tokio::test]
async fn test_missing_interpreter_is_runtime_error() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("ghost", "boo"))
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("failed to spawn"), "{}", result.stderr);
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_result_wire_format() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let result = runner
        .execute(&ExecutionRequest::new("shell", "echo hi"))
        .await
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["stdout"], "hi");
    assert_eq!(json["stderr"], "");
    assert_eq!(json["exitCode"], 0);
    assert_eq!(json["status"], "Accepted");
    assert_eq!(json["timedOut"], false);
    assert!(json["executionTimeMs"].is_u64());
}

#[tokio::test]
async fn test_request_from_json() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = test_runner(scratch.path());

    let request: ExecutionRequest = serde_json::from_str(
        r#"{"language":"shell","sourceCode":"read a b\necho $((a + b))","stdin":"2 40"}"#,
    )
    .unwrap();
    let result = runner.execute(&request).await.unwrap();

    assert_eq!(result.stdout, "42");
}
