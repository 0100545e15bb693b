use crate::constants::limits::LOG_SUBSTRING_LENGTH;
use crate::constants::ssh::{
    BATCH_MODE, DEFAULT_SHELL, DEFAULT_SHELL_CMD_ARG, DISABLE_TTY, IDENTITIES_ONLY, PROGRAM,
};
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::process::{ProcessRunner, SpawnOptions, SpawnOutput, SpawnRequest};
use crate::services::validation::Validation;
use crate::utils::feature_flags::is_strict_mode_enabled;
use crate::utils::text::preview;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").expect("line break regex"));

/// Partial command configuration. Unknown keys are dropped on deserialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub identity_file: Option<String>,
    /// Remote working directory; stored as the command's working directory.
    pub cwd: Option<String>,
    /// Extra flags for the ssh client, placed before `user@host`.
    pub args: Option<Vec<String>>,
    pub shell: Option<String>,
    pub shell_cmd_arg: Option<String>,
    pub collect_out: Option<bool>,
}

impl SshParams {
    pub fn from_value(value: &Value) -> Result<Self, ToolError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|err| ToolError::invalid_params(format!("invalid ssh options: {}", err)))
    }

    /// Fields set in `other` win over fields set in `self`.
    pub fn merged_with(&self, other: &SshParams) -> SshParams {
        SshParams {
            host: other.host.clone().or_else(|| self.host.clone()),
            port: other.port.or(self.port),
            user: other.user.clone().or_else(|| self.user.clone()),
            identity_file: other
                .identity_file
                .clone()
                .or_else(|| self.identity_file.clone()),
            cwd: other.cwd.clone().or_else(|| self.cwd.clone()),
            args: other.args.clone().or_else(|| self.args.clone()),
            shell: other.shell.clone().or_else(|| self.shell.clone()),
            shell_cmd_arg: other
                .shell_cmd_arg
                .clone()
                .or_else(|| self.shell_cmd_arg.clone()),
            collect_out: other.collect_out.or(self.collect_out),
        }
    }
}

/// One remote invocation: a shell command, its positional arguments and
/// spawn options. `options.cwd` is the remote directory to `cd` into and is
/// never forwarded to the local spawn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub command: String,
    pub args: Vec<String>,
    pub options: SpawnOptions,
}

impl RunRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.args.extend(args.into_iter().map(|arg| arg.to_string()));
        self
    }

    pub fn with_options(mut self, options: SpawnOptions) -> Self {
        self.options = options;
        self
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

pub fn escape_command(command: &str) -> String {
    LINE_BREAK_RE
        .replace_all(&command.replace('\'', "''"), "")
        .into_owned()
}

pub fn escape_arg(arg: &str) -> String {
    arg.replace('"', "\\\"")
}

/// Runs a shell command on a remote host through the local `ssh` client.
///
/// It never talks to the network itself: it assembles the `ssh` argument
/// vector (fixed identity, batch and tty flags, optional port and extra
/// flags, `user@host`) plus a single remote line of the shape
/// `<shell> <flag> '[cd "<dir>" && ]<command> "<arg1>" "<arg2>" ...'`
/// and hands both to a `ProcessRunner`. Single quotes in the command are
/// doubled and line breaks dropped; double quotes inside arguments are
/// backslash-escaped.
#[derive(Clone)]
pub struct SshCommand {
    logger: Logger,
    validation: Validation,
    runner: Arc<dyn ProcessRunner>,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    identity_file: Option<String>,
    working_directory: Option<String>,
    extra_args: Option<Vec<String>>,
    shell: String,
    shell_cmd_arg: String,
    collect_out: bool,
    strict: bool,
}

impl SshCommand {
    pub fn new(params: &SshParams, runner: Arc<dyn ProcessRunner>, logger: &Logger) -> Self {
        let mut command = Self {
            logger: logger.child("ssh"),
            validation: Validation::new(),
            runner,
            host: None,
            port: None,
            user: None,
            identity_file: None,
            working_directory: None,
            extra_args: None,
            shell: non_empty(&params.shell).unwrap_or_else(|| DEFAULT_SHELL.to_string()),
            shell_cmd_arg: non_empty(&params.shell_cmd_arg)
                .unwrap_or_else(|| DEFAULT_SHELL_CMD_ARG.to_string()),
            collect_out: params.collect_out.unwrap_or(false),
            strict: is_strict_mode_enabled(),
        };
        command.set_params(params);
        command
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Merges the recognized connection fields of `params`. Shell settings
    /// and anything else are left untouched.
    pub fn set_params(&mut self, params: &SshParams) {
        if let Some(cwd) = non_empty(&params.cwd) {
            self.working_directory = Some(cwd);
        }
        if let Some(host) = non_empty(&params.host) {
            self.host = Some(host);
        }
        if let Some(port) = params.port.filter(|port| *port != 0) {
            self.port = Some(port);
        }
        if let Some(user) = non_empty(&params.user) {
            self.user = Some(user);
        }
        if let Some(identity_file) = non_empty(&params.identity_file) {
            self.identity_file = Some(identity_file);
        }
        if let Some(args) = params.args.as_ref() {
            self.extra_args = Some(args.clone());
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn identity_file(&self) -> Option<&str> {
        self.identity_file.as_deref()
    }

    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }

    pub fn extra_args(&self) -> &[String] {
        self.extra_args.as_deref().unwrap_or(&[])
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn shell_cmd_arg(&self) -> &str {
        &self.shell_cmd_arg
    }

    pub fn collects_output(&self) -> bool {
        self.collect_out
    }

    /// The single-quoted shell line executed on the remote host.
    pub fn remote_line(&self, request: &RunRequest) -> String {
        let mut line = format!("{} {} '", self.shell, self.shell_cmd_arg);

        let cwd = non_empty(&request.options.cwd).or_else(|| self.working_directory.clone());
        if let Some(dir) = cwd {
            line.push_str(&format!("cd \"{}\" && ", dir));
        }

        line.push_str(&escape_command(&request.command));
        line.push(' ');
        line.push_str(
            &request
                .args
                .iter()
                .map(|arg| format!("\"{}\"", escape_arg(arg)))
                .collect::<Vec<_>>()
                .join(" "),
        );
        line.push('\'');
        line
    }

    /// Full argument vector for the local `ssh` client.
    pub fn ssh_args(&self, request: &RunRequest) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            self.identity_file.clone().unwrap_or_default(),
            "-o".to_string(),
            IDENTITIES_ONLY.to_string(),
            "-o".to_string(),
            BATCH_MODE.to_string(),
            DISABLE_TTY.to_string(),
        ];

        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }

        args.extend(self.extra_args().iter().cloned());

        args.push(format!(
            "{}@{}",
            self.user.as_deref().unwrap_or_default(),
            self.host.as_deref().unwrap_or_default()
        ));
        args.push(self.remote_line(request));
        args
    }

    fn ensure_configured(&self) -> Result<(), ToolError> {
        self.validation.ensure_string(self.host.as_deref(), "host")?;
        self.validation.ensure_string(self.user.as_deref(), "user")?;
        self.validation
            .ensure_string(self.identity_file.as_deref(), "identityFile")?;
        self.validation.ensure_port(self.port)?;
        Ok(())
    }

    pub async fn run(&self, request: RunRequest) -> Result<SpawnOutput, ToolError> {
        if self.strict {
            self.ensure_configured().map_err(|err| {
                err.with_hint("Set host, user and identityFile in the node options.")
            })?;
        }

        let args = self.ssh_args(&request);
        let mut options = request.options.without_cwd();
        options.collect_out = options.collect_out || self.collect_out;

        if let Some(line) = args.last() {
            self.logger.debug(
                "run",
                Some(&serde_json::json!({
                    "host": self.host,
                    "command": preview(line, LOG_SUBSTRING_LENGTH),
                })),
            );
        }

        self.runner
            .run(SpawnRequest {
                program: PROGRAM.to_string(),
                args,
                options,
            })
            .await
    }
}
