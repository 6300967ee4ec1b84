use std::sync::Arc;

use agent::{GeminiModelService, ToolLoop};
use anyhow::Context;
use deploy::VercelDeployer;
use interpreter::{CommandInterpreter, DiskWorkspace, ShellExecutor, Workspace};
use tracing::warn;

use crate::{api::ApiContext, config::Settings};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
}

impl AppState {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let workspace = DiskWorkspace::open(&settings.project_root)
            .await
            .with_context(|| {
                format!(
                    "failed to open project root '{}'",
                    settings.project_root.display()
                )
            })?;
        let root = workspace.root().to_path_buf();
        let interpreter = CommandInterpreter::new(
            Arc::new(workspace),
            Arc::new(ShellExecutor::new(&root, settings.command_timeout())),
        );

        let api_key = settings.gemini_api_key.clone().unwrap_or_else(|| {
            warn!("GEMINI_API_KEY is not set; generation requests will be rejected by the model service");
            String::new()
        });
        let mut model = GeminiModelService::new(api_key, settings.model_name.clone())
            .with_timeout(settings.model_timeout());
        if let Some(base_url) = &settings.model_base_url {
            model = model.with_base_url(base_url.clone());
        }
        let tool_loop = ToolLoop::new(Arc::new(model), interpreter)
            .with_max_iterations(settings.max_tool_iterations);

        let deployer = VercelDeployer::new(Arc::new(ShellExecutor::new(
            &root,
            settings.deploy_timeout(),
        )))
        .with_token(settings.vercel_token.clone())
        .with_timeout(settings.deploy_timeout());

        Ok(Self {
            api: ApiContext::new(tool_loop, Arc::new(deployer), settings.auto_deploy),
        })
    }
}
