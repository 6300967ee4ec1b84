use std::{io, path::PathBuf, process::Output, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command as ProcessCommand;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl ExecOutput {
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

impl From<Output> for ExecOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs a free-form command line through the platform shell.
    async fn run_shell(&self, command: &str) -> Result<ExecOutput, ExecError>;
    /// Runs one program with explicit arguments, no shell involved.
    async fn run_program(&self, program: &str, args: &[String]) -> Result<ExecOutput, ExecError>;
}

#[derive(Debug, Clone)]
pub struct ShellExecutor {
    working_dir: PathBuf,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(working_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout,
        }
    }

    async fn run(&self, label: &str, mut command: ProcessCommand) -> Result<ExecOutput, ExecError> {
        command.current_dir(&self.working_dir).kill_on_drop(true);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ExecError::Timeout {
                program: label.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| ExecError::Spawn {
                program: label.to_string(),
                source,
            })?;
        Ok(output.into())
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn run_shell(&self, command: &str) -> Result<ExecOutput, ExecError> {
        let mut process = if cfg!(windows) {
            let mut process = ProcessCommand::new("cmd");
            process.arg("/C");
            process
        } else {
            let mut process = ProcessCommand::new("sh");
            process.arg("-c");
            process
        };
        process.arg(command);
        self.run(command, process).await
    }

    async fn run_program(&self, program: &str, args: &[String]) -> Result<ExecOutput, ExecError> {
        let mut process = ProcessCommand::new(program);
        process.args(args);
        self.run(program, process).await
    }
}

#[cfg(test)]
#[path = "tests/exec_tests.rs"]
mod tests;
