use crate::errors::ToolError;
use crate::managers::node::NodeOptions;
use crate::managers::ssh::{SshCommand, SshParams};
use crate::managers::workspace::WorkspacePreparer;
use crate::services::logger::Logger;
use crate::services::process::ProcessRunner;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub name: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Runs one project's work on a remote host. Every command it hands out
/// carries the node's connection options.
#[derive(Clone)]
pub struct SshExecutor {
    logger: Logger,
    project: Project,
    options: NodeOptions,
    runner: Arc<dyn ProcessRunner>,
    workspace: WorkspacePreparer,
}

impl SshExecutor {
    pub fn new(
        project: Project,
        options: NodeOptions,
        runner: Arc<dyn ProcessRunner>,
        logger: &Logger,
    ) -> Result<Self, ToolError> {
        let logger = logger.child("executor");
        let workspace = WorkspacePreparer::new(
            options.base_dir.as_deref(),
            &project.name,
            options.ssh.clone(),
            runner.clone(),
            &logger,
        )?;
        Ok(Self {
            logger,
            project,
            options,
            runner,
            workspace,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    /// Remote workspace root of the project.
    pub fn cwd(&self) -> &Path {
        self.workspace.workspace_root()
    }

    pub fn workspace(&self) -> &WorkspacePreparer {
        &self.workspace
    }

    pub fn create_command(&self, params: &SshParams) -> SshCommand {
        let merged = self.options.ssh.merged_with(params);
        SshCommand::new(&merged, self.runner.clone(), &self.logger)
    }

    /// Whether the project workspace is already present remotely. Creates
    /// the workspace parent when it is not.
    pub async fn is_cloned(&self) -> Result<bool, ToolError> {
        self.workspace.ensure_ready().await
    }
}
