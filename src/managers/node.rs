use crate::errors::ToolError;
use crate::managers::executor::{Project, SshExecutor};
use crate::managers::ssh::SshParams;
use crate::services::logger::Logger;
use crate::services::process::ProcessRunner;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Options of an ssh node: where project workspaces live on the remote host
/// plus the connection parameters every command inherits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeOptions {
    pub base_dir: Option<String>,
    #[serde(flatten)]
    pub ssh: SshParams,
}

impl NodeOptions {
    pub fn from_value(value: &Value) -> Result<Self, ToolError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|err| ToolError::invalid_params(format!("invalid node options: {}", err)))
    }
}

#[derive(Clone)]
pub struct SshNode {
    logger: Logger,
    node_type: String,
    options: NodeOptions,
    runner: Arc<dyn ProcessRunner>,
}

impl SshNode {
    pub fn new(
        node_type: &str,
        options: NodeOptions,
        runner: Arc<dyn ProcessRunner>,
        logger: &Logger,
    ) -> Self {
        Self {
            logger: logger.child("node"),
            node_type: node_type.to_string(),
            options,
            runner,
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    pub fn create_executor(&self, project: &Project) -> Result<SshExecutor, ToolError> {
        self.logger.debug(
            "create_executor",
            Some(&serde_json::json!({
                "type": self.node_type,
                "project": project.name,
                "host": self.options.ssh.host,
            })),
        );
        SshExecutor::new(
            project.clone(),
            self.options.clone(),
            self.runner.clone(),
            &self.logger,
        )
    }
}
