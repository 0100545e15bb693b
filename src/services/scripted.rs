use crate::errors::ToolError;
use crate::services::process::{ProcessRunner, SpawnOutput, SpawnRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Test double for `ProcessRunner`: records requests and replays scripted
/// results in order.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<SpawnOutput, ToolError>>>,
    requests: Mutex<Vec<SpawnRequest>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<SpawnOutput, ToolError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience for scripting a sequence of successful stdout payloads.
    pub fn with_stdout(outputs: &[&str]) -> Self {
        Self::with_responses(
            outputs
                .iter()
                .map(|out| Ok(SpawnOutput::with_stdout(*out)))
                .collect(),
        )
    }

    pub fn requests(&self) -> Vec<SpawnRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    /// The remote shell line (last ssh argument) of every recorded request.
    pub fn remote_lines(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|req| req.args.last().cloned())
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, request: SpawnRequest) -> Result<SpawnOutput, ToolError> {
        self.requests
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(SpawnOutput::with_stdout("")))
    }
}
