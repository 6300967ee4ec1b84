//! Turns one shell-like command string into a project file mutation or a
//! passthrough execution, and reports the outcome as a tagged result.

use std::sync::Arc;

use shared::domain::CommandResult;
use tracing::{debug, warn};

pub mod command;
pub mod exec;
pub mod workspace;

pub use command::{Command, ParseError, PathError, ProjectPath};
pub use exec::{ExecError, ExecOutput, Executor, ShellExecutor};
pub use workspace::{DirOutcome, DiskWorkspace, Workspace, WorkspaceError};

#[derive(Clone)]
pub struct CommandInterpreter {
    workspace: Arc<dyn Workspace>,
    executor: Arc<dyn Executor>,
}

impl CommandInterpreter {
    pub fn new(workspace: Arc<dyn Workspace>, executor: Arc<dyn Executor>) -> Self {
        Self {
            workspace,
            executor,
        }
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    /// Never fails: parse and filesystem errors come back as
    /// failure-tagged results so the caller can keep going.
    pub async fn execute(&self, raw: &str) -> CommandResult {
        match Command::parse(raw) {
            Ok(command) => self.apply(&command).await,
            Err(error) => {
                warn!(command = raw, %error, "rejected command");
                CommandResult::failure(error.to_string())
            }
        }
    }

    pub async fn apply(&self, command: &Command) -> CommandResult {
        debug!(verb = command.verb(), path = ?command.path().map(ToString::to_string), "applying command");
        let result = match command {
            Command::Write { path, content } => self
                .workspace
                .write_file(path, content)
                .await
                .map(|()| CommandResult::success(format!("file written: {path}"))),
            Command::Touch { path } => self
                .workspace
                .write_file(path, "")
                .await
                .map(|()| CommandResult::success(format!("empty file created: {path}"))),
            Command::Mkdir { path } => {
                self.workspace
                    .create_dir_all(path)
                    .await
                    .map(|outcome| match outcome {
                        DirOutcome::Created => {
                            CommandResult::success(format!("folder created: {path}"))
                        }
                        DirOutcome::AlreadyExists => {
                            CommandResult::success(format!("folder already exists: {path}"))
                        }
                    })
            }
            Command::Exec { command } => return self.passthrough(command).await,
        };

        result.unwrap_or_else(|error| {
            warn!(verb = command.verb(), %error, "command failed");
            CommandResult::failure(error.to_string())
        })
    }

    async fn passthrough(&self, command: &str) -> CommandResult {
        match self.executor.run_shell(command).await {
            Ok(output) if !output.stderr.trim().is_empty() => {
                CommandResult::failure(output.stderr.trim_end().to_string())
            }
            Ok(output) if !output.success => {
                let stdout = output.stdout.trim_end();
                if stdout.is_empty() {
                    CommandResult::failure("command exited with a non-zero status")
                } else {
                    CommandResult::failure(format!(
                        "command exited with a non-zero status\n{stdout}"
                    ))
                }
            }
            Ok(output) => CommandResult::success(format!(
                "command completed\n{}",
                output.stdout.trim_end()
            )),
            Err(error) => {
                warn!(command, %error, "passthrough execution failed");
                CommandResult::failure(error.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
