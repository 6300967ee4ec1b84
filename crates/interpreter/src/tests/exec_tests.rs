use super::*;

#[test]
fn combined_output_joins_non_empty_streams() {
    let output = ExecOutput {
        stdout: "built".into(),
        stderr: "warning: slow".into(),
        success: true,
    };
    assert_eq!(output.combined(), "built\nwarning: slow");

    let quiet = ExecOutput {
        stdout: "only stdout".into(),
        stderr: "  ".into(),
        success: true,
    };
    assert_eq!(quiet.combined(), "only stdout");
}

#[cfg(unix)]
#[tokio::test]
async fn shell_executor_captures_both_streams_in_working_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("marker.txt"), "here").expect("marker");
    let executor = ShellExecutor::new(temp.path(), Duration::from_secs(10));

    let output = executor
        .run_shell("cat marker.txt; echo oops 1>&2")
        .await
        .expect("run");
    assert_eq!(output.stdout, "here");
    assert_eq!(output.stderr.trim(), "oops");
    assert!(output.success);
}

#[cfg(unix)]
#[tokio::test]
async fn shell_executor_times_out_long_commands() {
    let temp = tempfile::tempdir().expect("tempdir");
    let executor = ShellExecutor::new(temp.path(), Duration::from_millis(100));

    let err = executor.run_shell("sleep 5").await.expect_err("timeout");
    assert!(matches!(err, ExecError::Timeout { .. }));
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let executor = ShellExecutor::new(temp.path(), Duration::from_secs(5));

    let err = executor
        .run_program("definitely-not-a-real-program-4821", &[])
        .await
        .expect_err("spawn");
    assert!(matches!(err, ExecError::Spawn { .. }));
}
