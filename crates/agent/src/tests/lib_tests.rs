use std::collections::VecDeque;

use super::*;
use async_trait::async_trait;
use interpreter::{DiskWorkspace, ExecError, ExecOutput, Executor};
use serde_json::json;
use shared::domain::CommandStatus;
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

/// Replays canned responses and records the history length it was shown.
#[derive(Default)]
struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, ModelServiceError>>>,
    seen_history_lens: Mutex<Vec<usize>>,
    last_history: Mutex<Vec<Turn>>,
    last_instruction: Mutex<String>,
    repeat_call: Option<CapabilityCall>,
}

impl ScriptedModel {
    fn with(script: Vec<Result<ModelResponse, ModelServiceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    fn always_calling(call: CapabilityCall) -> Self {
        Self {
            repeat_call: Some(call),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelServiceError> {
        assert_eq!(request.capabilities.len(), 1);
        assert_eq!(request.capabilities[0].name, EXECUTE_COMMAND);
        assert!(!request.instruction.is_empty());
        self.seen_history_lens.lock().await.push(request.history.len());
        *self.last_history.lock().await = request.history.to_vec();
        *self.last_instruction.lock().await = request.instruction.to_string();

        if let Some(call) = &self.repeat_call {
            return Ok(ModelResponse::call(call.clone()));
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::text("script exhausted")))
    }
}

async fn tool_loop(model: Arc<ScriptedModel>) -> (tempfile::TempDir, ToolLoop) {
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = DiskWorkspace::open(temp.path()).await.expect("open");
    let interpreter = CommandInterpreter::new(Arc::new(workspace), Arc::new(NoShell));
    (temp, ToolLoop::new(model, interpreter))
}

fn call(command: &str) -> Result<ModelResponse, ModelServiceError> {
    Ok(ModelResponse::call(CapabilityCall::execute_command(command)))
}

#[tokio::test]
async fn runs_commands_until_the_model_answers_in_text() {
    let model = Arc::new(ScriptedModel::with(vec![
        call("mkdir portfolio"),
        call("touch portfolio/index.html"),
        call(r#"echo "<html><body>Hi</body></html>" > portfolio/index.html"#),
        Ok(ModelResponse::text("  Done \n")),
    ]));
    let (temp, tool_loop) = tool_loop(model.clone()).await;
    let mut session = Session::new();

    let outputs = tool_loop
        .run(&mut session, "create a portfolio site")
        .await
        .expect("run");

    assert_eq!(outputs.len(), 4);
    for item in &outputs[..3] {
        match item {
            OutputItem::Command { result, .. } => assert!(result.is_success(), "{result}"),
            other => panic!("expected command item, got {other:?}"),
        }
    }
    assert_eq!(outputs[3], OutputItem::text("Done"));
    assert_eq!(
        std::fs::read_to_string(temp.path().join("portfolio/index.html")).expect("read"),
        "<html><body>Hi</body></html>"
    );

    // Each iteration sees two more turns than the last.
    assert_eq!(*model.seen_history_lens.lock().await, vec![1, 3, 5, 7]);
    assert_eq!(session.len(), 8);
}

#[tokio::test]
async fn call_and_result_are_fed_back_into_history() {
    let model = Arc::new(ScriptedModel::with(vec![
        call("mkdir blog"),
        Ok(ModelResponse::text("ok")),
    ]));
    let (_temp, tool_loop) = tool_loop(model.clone()).await;
    let mut session = Session::new();
    tool_loop.run(&mut session, "make a blog").await.expect("run");

    let history = model.last_history.lock().await.clone();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0], Turn::user_text("make a blog"));
    assert_eq!(history[1].role, Role::Model);
    assert_eq!(
        history[1].parts,
        vec![Part::Call(CapabilityCall::execute_command("mkdir blog"))]
    );
    assert_eq!(history[2].role, Role::User);
    match &history[2].parts[0] {
        Part::CallResult { name, result } => {
            assert_eq!(name, EXECUTE_COMMAND);
            assert!(result.starts_with("success: "));
        }
        other => panic!("unexpected part: {other:?}"),
    }
}

#[tokio::test]
async fn stops_at_the_iteration_cap_when_the_model_never_finishes() {
    let model = Arc::new(ScriptedModel::always_calling(
        CapabilityCall::execute_command("mkdir again"),
    ));
    let (_temp, tool_loop) = tool_loop(model.clone()).await;
    let tool_loop = tool_loop.with_max_iterations(5);
    let mut session = Session::new();

    let outputs = tool_loop.run(&mut session, "loop forever").await.expect("run");

    assert_eq!(model.seen_history_lens.lock().await.len(), 5);
    assert_eq!(outputs.len(), 6);
    match outputs.last() {
        Some(OutputItem::Text { text }) => assert!(text.contains("Stopped after 5 tool calls")),
        other => panic!("expected truncation notice, got {other:?}"),
    }
}

#[tokio::test]
async fn only_the_first_of_several_calls_is_executed() {
    let model = Arc::new(ScriptedModel::with(vec![
        Ok(ModelResponse {
            calls: vec![
                CapabilityCall::execute_command("mkdir first"),
                CapabilityCall::execute_command("mkdir second"),
            ],
            text: None,
        }),
        Ok(ModelResponse::text("done")),
    ]));
    let (temp, tool_loop) = tool_loop(model).await;
    let mut session = Session::new();

    let outputs = tool_loop.run(&mut session, "two at once").await.expect("run");

    assert_eq!(outputs.len(), 2);
    assert!(temp.path().join("first").is_dir());
    assert!(!temp.path().join("second").exists());
}

#[tokio::test]
async fn model_failure_aborts_the_request_verbatim() {
    let model = Arc::new(ScriptedModel::with(vec![
        call("mkdir site"),
        Err(ModelServiceError::Status {
            status: 429,
            body: "quota exceeded".into(),
        }),
    ]));
    let (_temp, tool_loop) = tool_loop(model).await;
    let mut session = Session::new();

    let err = tool_loop
        .run(&mut session, "anything")
        .await
        .expect_err("model failure");
    assert_eq!(err.to_string(), "model service returned 429: quota exceeded");
}

#[tokio::test]
async fn interpreter_failures_do_not_abort_the_loop() {
    let model = Arc::new(ScriptedModel::with(vec![
        call(r#"echo "x" > ../escape.html"#),
        call("npm run build"),
        Ok(ModelResponse::text("recovered")),
    ]));
    let (_temp, tool_loop) = tool_loop(model.clone()).await;
    let mut session = Session::new();

    let outputs = tool_loop.run(&mut session, "try it").await.expect("run");

    let statuses: Vec<_> = outputs
        .iter()
        .filter_map(|item| match item {
            OutputItem::Command { result, .. } => Some(result.status),
            OutputItem::Text { .. } => None,
        })
        .collect();
    assert_eq!(statuses, vec![CommandStatus::Failure, CommandStatus::Failure]);
    assert_eq!(outputs.last(), Some(&OutputItem::text("recovered")));

    let history = model.last_history.lock().await.clone();
    match &history[2].parts[0] {
        Part::CallResult { result, .. } => assert!(result.starts_with("failure: ")),
        other => panic!("unexpected part: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_capabilities_and_bad_arguments_are_answered_with_failures() {
    let model = Arc::new(ScriptedModel::with(vec![
        Ok(ModelResponse::call(CapabilityCall {
            name: "deleteEverything".into(),
            args: json!({}),
        })),
        Ok(ModelResponse::call(CapabilityCall {
            name: EXECUTE_COMMAND.into(),
            args: json!({ "command": 7 }),
        })),
        Ok(ModelResponse::text("sorry")),
    ]));
    let (_temp, tool_loop) = tool_loop(model).await;
    let mut session = Session::new();

    let outputs = tool_loop.run(&mut session, "oops").await.expect("run");

    match &outputs[0] {
        OutputItem::Command { command, result } => {
            assert!(command.starts_with("deleteEverything"));
            assert!(result.message.contains("unknown capability"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
    match &outputs[1] {
        OutputItem::Command { result, .. } => {
            assert_eq!(result.message, "missing string argument `command`")
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn blank_final_text_produces_no_text_item() {
    let model = Arc::new(ScriptedModel::with(vec![Ok(ModelResponse::text("   "))]));
    let (_temp, tool_loop) = tool_loop(model).await;
    let mut session = Session::new();

    let outputs = tool_loop.run(&mut session, "quiet").await.expect("run");
    assert!(outputs.is_empty());
}

#[test]
fn session_reset_clears_history_and_rotates_id() {
    let mut session = Session::new();
    let first_id = session.id();
    session.push(Turn::user_text("hello"));
    session.reset();
    assert!(session.is_empty());
    assert_ne!(session.id(), first_id);
}

#[tokio::test]
async fn default_instruction_can_be_replaced() {
    let model = Arc::new(ScriptedModel::with(vec![Ok(ModelResponse::text("ok"))]));
    let (_temp, first_loop) = tool_loop(model.clone()).await;
    let mut session = Session::new();
    first_loop.run(&mut session, "hi").await.expect("run");
    assert!(model
        .last_instruction
        .lock()
        .await
        .contains("mkdir"));

    let model = Arc::new(ScriptedModel::with(vec![Ok(ModelResponse::text("ok"))]));
    let (_temp, tool_loop) = tool_loop(model.clone()).await;
    let tool_loop = tool_loop.with_instruction("Only build landing pages.");
    tool_loop.run(&mut Session::new(), "hi").await.expect("run");
    assert_eq!(*model.last_instruction.lock().await, "Only build landing pages.");
}
