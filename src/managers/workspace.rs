use crate::constants::workspace::{DEFAULT_BASE_DIR, EXISTS_MARKER, SEGMENT};
use crate::errors::ToolError;
use crate::managers::ssh::{RunRequest, SshCommand, SshParams};
use crate::services::logger::Logger;
use crate::services::process::{ProcessRunner, SpawnOutput};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lexically normalizes a POSIX path: collapses repeated separators, drops
/// `.` and resolves `..` against earlier components.
pub fn normalize_remote_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// `<base>/<project>/workspace`. The project name is always nested under the
/// base directory: leading separators are ignored and `..` is rejected.
pub fn resolve_workspace_root(
    base_dir: Option<&str>,
    project: &str,
) -> Result<PathBuf, ToolError> {
    let name = project.trim().trim_matches('/');
    let escapes = name.split('/').any(|part| part == "..");
    if escapes || normalize_remote_path(name) == "." {
        return Err(ToolError::invalid_params(format!(
            "project name must stay inside the base directory: '{}'",
            project
        ))
        .with_hint("Use a project name without '..' components."));
    }
    let base = base_dir
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .unwrap_or(DEFAULT_BASE_DIR);
    let joined = format!("{}/{}/{}", base, name, SEGMENT);
    Ok(PathBuf::from(normalize_remote_path(&joined)))
}

pub fn existence_check_command(path: &Path) -> String {
    format!("test -e \"{}\"; echo $?", path.display())
}

pub fn create_parent_command(path: &Path) -> String {
    let parent = path.parent().unwrap_or(path);
    format!("mkdir -p \"{}\"", parent.display())
}

/// `true` when the echoed exit status of `test -e` is zero.
pub fn parse_existence(output: &SpawnOutput) -> bool {
    output.first_line() == Some(EXISTS_MARKER)
}

/// Makes sure the parent of a project's remote workspace exists.
///
/// The workspace directory itself is left for the checkout to create.
#[derive(Clone)]
pub struct WorkspacePreparer {
    logger: Logger,
    runner: Arc<dyn ProcessRunner>,
    options: SshParams,
    workspace_root: PathBuf,
}

impl WorkspacePreparer {
    pub fn new(
        base_dir: Option<&str>,
        project: &str,
        options: SshParams,
        runner: Arc<dyn ProcessRunner>,
        logger: &Logger,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            logger: logger.child("workspace"),
            runner,
            options,
            workspace_root: resolve_workspace_root(base_dir, project)?,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn options(&self) -> &SshParams {
        &self.options
    }

    fn command(&self, params: &SshParams) -> SshCommand {
        SshCommand::new(params, self.runner.clone(), &self.logger)
    }

    async fn check_existence(&self) -> Result<bool, ToolError> {
        let params = SshParams {
            collect_out: Some(true),
            ..self.options.clone()
        };
        let output = self
            .command(&params)
            .run(RunRequest::new(existence_check_command(&self.workspace_root)))
            .await?;
        Ok(parse_existence(&output))
    }

    async fn create_parent(&self) -> Result<(), ToolError> {
        self.command(&self.options)
            .run(RunRequest::new(create_parent_command(&self.workspace_root)))
            .await?;
        Ok(())
    }

    /// Returns whether the workspace already existed. When it did not, its
    /// parent directory is created. Errors from either step are returned
    /// as-is and no retry is attempted.
    pub async fn ensure_ready(&self) -> Result<bool, ToolError> {
        let exists = self.check_existence().await?;
        self.logger.info(
            "workspace checked",
            Some(&serde_json::json!({
                "path": self.workspace_root.display().to_string(),
                "exists": exists,
            })),
        );
        if !exists {
            self.create_parent().await?;
        }
        Ok(exists)
    }
}
