pub mod constants;
pub mod errors;
pub mod managers;
pub mod services;
pub mod utils;

pub use errors::{ToolError, ToolErrorKind};
pub use managers::executor::{Project, SshExecutor};
pub use managers::node::{NodeOptions, SshNode};
pub use managers::ssh::{RunRequest, SshCommand, SshParams};
pub use managers::workspace::WorkspacePreparer;
pub use services::process::{ProcessRunner, SpawnOptions, SpawnOutput, SpawnRequest};
