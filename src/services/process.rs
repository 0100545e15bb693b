use crate::constants::limits::STDERR_DETAIL_BYTES;
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::logger::Logger;
use crate::utils::text::truncate_utf8_prefix;
use async_trait::async_trait;
use serde::Serialize;
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Local working directory of the spawned process.
    pub cwd: Option<String>,
    /// Capture stdout into `SpawnOutput::stdout` instead of inheriting it.
    pub collect_out: bool,
    pub env: Vec<(String, String)>,
    pub timeout_ms: Option<u64>,
}

impl SpawnOptions {
    pub fn collecting() -> Self {
        Self {
            collect_out: true,
            ..Self::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn without_cwd(&self) -> Self {
        Self {
            cwd: None,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: String,
    pub args: Vec<String>,
    pub options: SpawnOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SpawnOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl SpawnOutput {
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().next().map(str::trim)
    }
}

/// Process-spawning capability used by every remote command: takes a program,
/// an argument vector and options, and resolves to the outcome.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, request: SpawnRequest) -> Result<SpawnOutput, ToolError>;
}

/// Production `ProcessRunner` backed by `tokio::process`.
#[derive(Clone, Debug)]
pub struct TokioProcessRunner {
    logger: Logger,
}

impl TokioProcessRunner {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("spawn"),
        }
    }
}

async fn drain<R>(reader: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

fn collected(
    program: &str,
    stream: &str,
    joined: Result<io::Result<Vec<u8>>, JoinError>,
) -> Result<Vec<u8>, ToolError> {
    let read = joined.map_err(|err| {
        ToolError::internal(format!("{} reader of {} failed: {}", stream, program, err))
    })?;
    read.map_err(|err| {
        ToolError::transport(format!("Failed to read {} of {}: {}", stream, program, err))
    })
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, request: SpawnRequest) -> Result<SpawnOutput, ToolError> {
        let SpawnRequest {
            program,
            args,
            options,
        } = request;

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&args);
        if let Some(cwd) = options.cwd.as_ref() {
            cmd.current_dir(cwd);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(if options.collect_out {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|err| {
            ToolError::transport(format!("Failed to spawn {}: {}", program, err))
        })?;

        let stdout_task = tokio::spawn(drain(child.stdout.take()));
        let stderr_task = tokio::spawn(drain(child.stderr.take()));

        let started = Instant::now();
        let mut timed_out = false;
        let status = match options.timeout_ms {
            Some(timeout) => {
                match tokio::time::timeout(Duration::from_millis(timeout), child.wait()).await {
                    Ok(result) => result,
                    Err(_) => {
                        timed_out = true;
                        if let Err(err) = child.kill().await {
                            self.logger.warn(
                                "failed to kill timed out process",
                                Some(&serde_json::json!({
                                    "program": program,
                                    "error": err.to_string(),
                                })),
                            );
                        }
                        child.wait().await
                    }
                }
            }
            None => child.wait().await,
        };
        let status = status.map_err(|err| {
            ToolError::internal(format!("Failed to wait for {}: {}", program, err))
        })?;

        if timed_out {
            // Grandchildren may still hold the pipes open.
            stdout_task.abort();
            stderr_task.abort();
            self.logger.warn(
                "process timed out",
                Some(&serde_json::json!({"program": program, "timeout_ms": options.timeout_ms})),
            );
            return Err(ToolError::timeout(format!(
                "{} did not finish within {} ms",
                program,
                options.timeout_ms.unwrap_or_default()
            )));
        }

        let stdout = collected(&program, "stdout", stdout_task.await)?;
        let stderr = collected(&program, "stderr", stderr_task.await)?;
        let output = SpawnOutput {
            success: status.success(),
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        if !output.success {
            let stderr = output.stderr.trim_end_matches(&['\r', '\n'][..]);
            return Err(ToolError::new(
                ToolErrorKind::Transport,
                "SPAWN_EXIT",
                format!("{} exited with code {}", program, output.exit_code),
            )
            .with_details(serde_json::json!({
                "program": program,
                "exit_code": output.exit_code,
                "stderr": truncate_utf8_prefix(stderr, STDERR_DETAIL_BYTES),
            })));
        }

        self.logger.debug(
            "process finished",
            Some(&serde_json::json!({"program": program, "duration_ms": output.duration_ms})),
        );
        Ok(output)
    }
}
