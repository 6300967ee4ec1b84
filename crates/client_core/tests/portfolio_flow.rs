use std::{collections::VecDeque, sync::Arc};

use agent::{
    CapabilityCall, ModelRequest, ModelResponse, ModelService, ModelServiceError, Session, ToolLoop,
};
use async_trait::async_trait;
use client_core::{
    DeploymentOrchestrator, DeploymentStatus, FileTree, ProjectView, PublishError, Publisher,
    TextSpliceCompositor,
};
use interpreter::{CommandInterpreter, DiskWorkspace, ExecError, ExecOutput, Executor, Workspace};
use tokio::sync::Mutex;

struct NoShell;

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

struct ScriptedModel(Mutex<VecDeque<ModelResponse>>);

#[async_trait]
impl ModelService for ScriptedModel {
    async fn generate(&self, _request: ModelRequest<'_>) -> Result<ModelResponse, ModelServiceError> {
        self.0
            .lock()
            .await
            .pop_front()
            .ok_or(ModelServiceError::EmptyResponse)
    }
}

struct RecordingPublisher(Mutex<Vec<String>>);

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, folder: &str) -> Result<String, PublishError> {
        self.0.lock().await.push(folder.to_string());
        Ok(format!("https://{folder}.vercel.app"))
    }
}

fn call(command: &str) -> ModelResponse {
    ModelResponse::call(CapabilityCall::execute_command(command))
}

#[tokio::test]
async fn portfolio_prompt_becomes_a_previewable_published_site() {
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = Arc::new(DiskWorkspace::open(temp.path()).await.expect("workspace"));
    let interpreter = CommandInterpreter::new(workspace.clone(), Arc::new(NoShell));
    let model = ScriptedModel(Mutex::new(
        vec![
            call("mkdir portfolio"),
            call("touch portfolio/index.html"),
            call(
                r#"echo "<!DOCTYPE html>\n<html>\n<head>\n<title>Me</title>\n</head>\n<body>\n<h1 class=\"name\">Ada</h1>\n</body>\n</html>" > portfolio/index.html"#,
            ),
            call(r#"echo ".name { color: teal; }" > portfolio/style.css"#),
            call(r#"echo "console.log(\"hi\");" > portfolio/script.js"#),
            ModelResponse::text("Your portfolio is ready."),
        ]
        .into(),
    ));
    let tool_loop = ToolLoop::new(Arc::new(model), interpreter);

    let mut session = Session::new();
    let outputs = tool_loop
        .run(&mut session, "create a portfolio site")
        .await
        .expect("run");
    assert_eq!(outputs.len(), 6);

    let mut view = ProjectView::new();
    view.apply_output(&outputs);
    assert_eq!(view.tree().file_count(), 3);
    assert_eq!(
        view.selection().map(|s| s.path.as_str()),
        Some("portfolio/index.html")
    );

    // The server's listing reproduces the same tree contents.
    let listed = workspace.list_files().await.expect("list");
    let hydrated = FileTree::hydrate(&listed).expect("hydrate");
    for file in view.tree().files() {
        assert_eq!(hydrated.lookup(&file.path), Some(file.content), "{}", file.path);
    }

    let preview = view.preview(&TextSpliceCompositor);
    assert!(preview.contains("<title>Me</title>\n<style>\n.name { color: teal; }\n</style>\n</head>"));
    assert!(preview.contains("<script>\nconsole.log(\"hi\");\n</script>\n</body>"));
    assert!(preview.contains(r#"<h1 class="name">Ada</h1>"#));

    let publisher = Arc::new(RecordingPublisher(Mutex::new(Vec::new())));
    let orchestrator = DeploymentOrchestrator::new(publisher.clone());
    let selected = view.selection().map(|s| format!("server/{}", s.path));
    let url = orchestrator
        .publish(selected.as_deref())
        .await
        .expect("publish");

    assert_eq!(url, "https://portfolio.vercel.app");
    assert_eq!(*publisher.0.lock().await, vec!["portfolio".to_string()]);
    assert_eq!(orchestrator.snapshot().await.status, DeploymentStatus::Succeeded);
}
