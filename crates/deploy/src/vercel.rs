use std::{path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use interpreter::{ExecError, ExecOutput, Executor};
use tracing::{info, warn};

use crate::{extract_url, Deployment, DeployError, DeploymentService, DEFAULT_DEPLOY_TIMEOUT};

pub const DEFAULT_HOST_SUFFIX: &str = ".vercel.app";

/// Drives the `vercel` CLI through an [`Executor`].
pub struct VercelDeployer {
    executor: Arc<dyn Executor>,
    program: String,
    install: Option<(String, Vec<String>)>,
    token: Option<String>,
    timeout: Duration,
    host_suffix: String,
}

impl VercelDeployer {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            program: "vercel".to_string(),
            install: Some((
                "npm".to_string(),
                vec!["install".into(), "-g".into(), "vercel".into()],
            )),
            token: None,
            timeout: DEFAULT_DEPLOY_TIMEOUT,
            host_suffix: DEFAULT_HOST_SUFFIX.to_string(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_host_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.host_suffix = suffix.into();
        self
    }

    /// `None` disables the install fallback.
    pub fn with_install_command(mut self, install: Option<(String, Vec<String>)>) -> Self {
        self.install = install;
        self
    }

    async fn tool_version(&self) -> Result<String, String> {
        match self
            .executor
            .run_program(&self.program, &["--version".to_string()])
            .await
        {
            Ok(output) if output.success => Ok(output.stdout.trim().to_string()),
            Ok(output) => Err(output.combined().trim().to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn ensure_tool(&self) -> Result<(), DeployError> {
        let reason = match self.tool_version().await {
            Ok(version) => {
                info!(program = %self.program, %version, "deployment tool present");
                return Ok(());
            }
            Err(reason) => reason,
        };

        let Some((installer, args)) = &self.install else {
            return Err(DeployError::ToolUnavailable(reason));
        };
        warn!(program = %self.program, %reason, "deployment tool missing; installing");
        match self.executor.run_program(installer, args).await {
            Ok(output) if output.success => {}
            Ok(output) => {
                return Err(DeployError::ToolUnavailable(format!(
                    "`{installer}` failed: {}",
                    output.combined().trim()
                )))
            }
            Err(e) => return Err(DeployError::ToolUnavailable(e.to_string())),
        }

        let version = self
            .tool_version()
            .await
            .map_err(DeployError::ToolUnavailable)?;
        info!(program = %self.program, %version, "deployment tool installed");
        Ok(())
    }

    fn deploy_args(&self, directory: &Path) -> Vec<String> {
        let mut args = vec![
            "deploy".to_string(),
            format!("--cwd={}", directory.display()),
            "--prod".to_string(),
            "--yes".to_string(),
        ];
        if let Some(token) = &self.token {
            args.push(format!("--token={token}"));
        }
        args
    }

    async fn run_deploy(&self, directory: &Path) -> Result<ExecOutput, DeployError> {
        let args = self.deploy_args(directory);
        let redacted: Vec<&str> = args
            .iter()
            .map(|arg| {
                if arg.starts_with("--token=") {
                    "--token=***"
                } else {
                    arg.as_str()
                }
            })
            .collect();
        info!(program = %self.program, args = ?redacted, "starting deployment");

        let run = self.executor.run_program(&self.program, &args);
        match tokio::time::timeout(self.timeout, run).await {
            Err(_) | Ok(Err(ExecError::Timeout { .. })) => Err(DeployError::Timeout(self.timeout)),
            Ok(Err(e @ ExecError::Spawn { .. })) => Err(DeployError::ToolUnavailable(e.to_string())),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

#[async_trait]
impl DeploymentService for VercelDeployer {
    async fn deploy(&self, directory: &Path) -> Result<Deployment, DeployError> {
        self.ensure_tool().await?;
        let output = self.run_deploy(directory).await?;
        let combined = output.combined();

        if !output.success {
            warn!(directory = %directory.display(), "deployment command failed");
            return Err(DeployError::Rejected {
                output: combined.trim().to_string(),
            });
        }

        match extract_url(&combined, &self.host_suffix) {
            Some(url) => {
                info!(directory = %directory.display(), %url, "deployment published");
                Ok(Deployment {
                    url,
                    output: combined,
                })
            }
            None => Err(DeployError::NoUrl {
                output: combined.trim().to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "tests/vercel_tests.rs"]
mod tests;
