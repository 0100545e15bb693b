mod common;
use common::quiet_logger;

use ssh_node::services::process::TokioProcessRunner;
use ssh_node::{ProcessRunner, SpawnOptions, SpawnRequest, ToolErrorKind};

fn sh(script: &str, options: SpawnOptions) -> SpawnRequest {
    SpawnRequest {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        options,
    }
}

#[tokio::test]
async fn collects_stdout_when_requested() {
    let runner = TokioProcessRunner::new(quiet_logger());
    let output = runner
        .run(sh("test -e /; echo $?", SpawnOptions::collecting()))
        .await
        .expect("run");

    assert!(output.success);
    assert_eq!(output.exit_code, 0);
    assert_eq!(output.first_line(), Some("0"));
}

#[tokio::test]
async fn passes_env_and_cwd() {
    let dir = std::env::temp_dir()
        .canonicalize()
        .expect("canonical temp dir");
    let runner = TokioProcessRunner::new(quiet_logger());
    let output = runner
        .run(sh(
            "printf '%s\\n' \"$SSH_NODE_MARKER\"; pwd -P",
            SpawnOptions::collecting()
                .with_cwd(dir.to_string_lossy().to_string())
                .with_env("SSH_NODE_MARKER", "marker-value"),
        ))
        .await
        .expect("run");

    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines[0], "marker-value");
    assert_eq!(lines[1], dir.to_string_lossy());
}

#[tokio::test]
async fn non_zero_exit_is_a_transport_error() {
    let runner = TokioProcessRunner::new(quiet_logger());
    let err = runner
        .run(sh(
            "echo 'Permission denied (publickey).' >&2; exit 255",
            SpawnOptions::collecting(),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ToolErrorKind::Transport);
    assert_eq!(err.code, "SPAWN_EXIT");
    let details = err.details.expect("details");
    assert_eq!(details["exit_code"], 255);
    assert_eq!(details["stderr"], "Permission denied (publickey).");
}

#[tokio::test]
async fn missing_program_is_a_transport_error() {
    let runner = TokioProcessRunner::new(quiet_logger());
    let err = runner
        .run(SpawnRequest {
            program: "ssh-node-definitely-missing-binary".to_string(),
            args: Vec::new(),
            options: SpawnOptions::default(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, ToolErrorKind::Transport);
    assert!(err.message.starts_with("Failed to spawn"));
}

#[tokio::test]
async fn timeout_kills_the_process() {
    let runner = TokioProcessRunner::new(quiet_logger());
    let started = std::time::Instant::now();
    let err = runner
        .run(sh("exec sleep 5", SpawnOptions::collecting().with_timeout_ms(200)))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ToolErrorKind::Timeout);
    assert!(err.retryable);
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}
