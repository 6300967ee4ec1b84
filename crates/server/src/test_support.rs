//! Fakes for the model, shell and hosting collaborators.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::Arc,
};

use agent::{
    CapabilityCall, ModelRequest, ModelResponse, ModelService, ModelServiceError, ToolLoop,
};
use async_trait::async_trait;
use deploy::{DeployError, Deployment, DeploymentService};
use interpreter::{CommandInterpreter, DiskWorkspace, ExecError, ExecOutput, Executor};
use tokio::sync::Mutex;

use crate::api::ApiContext;

pub struct NoShell;

#[async_trait]
impl Executor for NoShell {
    async fn run_shell(&self, command: &str) -> Result<ExecOutput, ExecError> {
        Ok(ExecOutput {
            stdout: String::new(),
            stderr: format!("shell disabled: {command}"),
            success: false,
        })
    }

    async fn run_program(&self, program: &str, _args: &[String]) -> Result<ExecOutput, ExecError> {
        self.run_shell(program).await
    }
}

#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, ModelServiceError>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<ModelResponse, ModelServiceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn generate(&self, _request: ModelRequest<'_>) -> Result<ModelResponse, ModelServiceError> {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::text("done")))
    }
}

pub fn call(command: &str) -> Result<ModelResponse, ModelServiceError> {
    Ok(ModelResponse::call(CapabilityCall::execute_command(command)))
}

pub enum DeployOutcome {
    Url(String),
    ToolMissing,
    Rejected,
    Timeout,
}

pub struct FakeDeployer {
    outcome: DeployOutcome,
    pub deployed: Mutex<Vec<PathBuf>>,
}

impl FakeDeployer {
    pub fn new(outcome: DeployOutcome) -> Self {
        Self {
            outcome,
            deployed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DeploymentService for FakeDeployer {
    async fn deploy(&self, directory: &Path) -> Result<Deployment, DeployError> {
        self.deployed.lock().await.push(directory.to_path_buf());
        match &self.outcome {
            DeployOutcome::Url(url) => Ok(Deployment {
                url: url.clone(),
                output: String::new(),
            }),
            DeployOutcome::ToolMissing => Err(DeployError::ToolUnavailable("vercel not found".into())),
            DeployOutcome::Rejected => Err(DeployError::Rejected {
                output: "no credentials".into(),
            }),
            DeployOutcome::Timeout => Err(DeployError::Timeout(std::time::Duration::from_secs(1))),
        }
    }
}

pub struct Fixture {
    pub temp: tempfile::TempDir,
    pub ctx: ApiContext,
    pub deployer: Arc<FakeDeployer>,
}

pub async fn fixture(
    script: Vec<Result<ModelResponse, ModelServiceError>>,
    outcome: DeployOutcome,
    auto_deploy: bool,
) -> Fixture {
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = DiskWorkspace::open(temp.path()).await.expect("workspace");
    let interpreter = CommandInterpreter::new(Arc::new(workspace), Arc::new(NoShell));
    let tool_loop = ToolLoop::new(Arc::new(ScriptedModel::new(script)), interpreter);
    let deployer = Arc::new(FakeDeployer::new(outcome));
    let ctx = ApiContext::new(tool_loop, deployer.clone(), auto_deploy);
    Fixture {
        temp,
        ctx,
        deployer,
    }
}
