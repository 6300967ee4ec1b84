use std::{path::PathBuf, sync::Arc};

use agent::{Session, ToolLoop};
use deploy::{DeployError, DeploymentService};
use interpreter::{Command, ProjectPath, Workspace};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{GenerateResponse, ListFilesResponse, OutputItem, PublishResponse},
};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub tool_loop: Arc<ToolLoop>,
    pub deployer: Arc<dyn DeploymentService>,
    /// One conversation at a time; holding the lock serializes prompts.
    pub session: Arc<Mutex<Session>>,
    pub auto_deploy: bool,
}

impl ApiContext {
    pub fn new(tool_loop: ToolLoop, deployer: Arc<dyn DeploymentService>, auto_deploy: bool) -> Self {
        Self {
            tool_loop: Arc::new(tool_loop),
            deployer,
            session: Arc::new(Mutex::new(Session::new())),
            auto_deploy,
        }
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        self.tool_loop.interpreter().workspace()
    }

    fn site_dir(&self, folder: &ProjectPath) -> PathBuf {
        self.workspace().root().join(folder.to_relative_path())
    }
}

pub async fn generate(ctx: &ApiContext, prompt: &str) -> Result<GenerateResponse, ApiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "prompt is required"));
    }

    let data = {
        let mut session = ctx.session.lock().await;
        session.reset();
        ctx.tool_loop
            .run(&mut session, prompt)
            .await
            .map_err(|e| ApiError::new(ErrorCode::ModelService, e.to_string()))?
    };

    let mut deployed_url = None;
    if ctx.auto_deploy {
        if let Some(folder) = first_created_folder(&data) {
            match ctx.deployer.deploy(&ctx.site_dir(&folder)).await {
                Ok(deployment) => deployed_url = Some(deployment.url),
                Err(error) => warn!(folder = %folder, %error, "auto-deploy failed"),
            }
        }
    }

    Ok(GenerateResponse {
        success: true,
        data,
        deployed_url,
    })
}

pub async fn list_files(ctx: &ApiContext) -> Result<ListFilesResponse, ApiError> {
    let files = ctx.workspace().list_files().await.map_err(internal)?;
    Ok(ListFilesResponse {
        success: true,
        files,
    })
}

pub async fn publish(ctx: &ApiContext, folder_name: &str) -> Result<PublishResponse, ApiError> {
    let folder = ProjectPath::parse(folder_name.trim()).map_err(|e| {
        ApiError::new(
            ErrorCode::Validation,
            format!("invalid folder name `{folder_name}`: {e}"),
        )
    })?;
    if !ctx.workspace().is_dir(&folder).await {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("folder not found: {folder}"),
        ));
    }

    let deployment = ctx
        .deployer
        .deploy(&ctx.site_dir(&folder))
        .await
        .map_err(deploy_error)?;
    info!(folder = %folder, url = %deployment.url, "folder published");
    Ok(PublishResponse {
        success: true,
        deployed_url: deployment.url,
    })
}

/// Top-level folder of the first `mkdir` that succeeded during a run.
pub fn first_created_folder(items: &[OutputItem]) -> Option<ProjectPath> {
    items.iter().find_map(|item| match item {
        OutputItem::Command { command, result } if result.is_success() => {
            match Command::parse(command) {
                Ok(Command::Mkdir { path }) => ProjectPath::parse(path.top_level()).ok(),
                _ => None,
            }
        }
        _ => None,
    })
}

fn deploy_error(error: DeployError) -> ApiError {
    let code = match &error {
        DeployError::ToolUnavailable(_) => ErrorCode::DeploymentToolUnavailable,
        DeployError::Rejected { .. } | DeployError::NoUrl { .. } => ErrorCode::DeploymentRejected,
        DeployError::Timeout(_) => ErrorCode::DeploymentTimeout,
    };
    ApiError::new(code, error.to_string())
}

fn internal(error: impl std::fmt::Display) -> ApiError {
    ApiError::new(ErrorCode::Internal, error.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
