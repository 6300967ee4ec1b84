//! The tool-calling loop: the model asks for commands, the interpreter runs
//! them, and results are fed back until the model answers in plain text.

use std::sync::Arc;

use interpreter::CommandInterpreter;
use shared::{domain::CommandResult, protocol::OutputItem};
use tracing::{error, info, warn};

pub mod gemini;
pub mod instruction;
pub mod model;
pub mod session;

pub use gemini::GeminiModelService;
pub use model::{
    CapabilityCall, CapabilityDeclaration, ModelRequest, ModelResponse, ModelService,
    ModelServiceError, EXECUTE_COMMAND,
};
pub use session::{Part, Role, Session, Turn};

pub const DEFAULT_MAX_ITERATIONS: usize = 25;

pub struct ToolLoop {
    model: Arc<dyn ModelService>,
    interpreter: CommandInterpreter,
    instruction: String,
    capabilities: Vec<CapabilityDeclaration>,
    max_iterations: usize,
}

impl ToolLoop {
    pub fn new(model: Arc<dyn ModelService>, interpreter: CommandInterpreter) -> Self {
        Self {
            model,
            interpreter,
            instruction: instruction::SITE_BUILDER_INSTRUCTION.to_string(),
            capabilities: vec![CapabilityDeclaration::execute_command()],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn interpreter(&self) -> &CommandInterpreter {
        &self.interpreter
    }

    /// Runs one prompt to completion. Only a model service failure aborts;
    /// command failures are fed back so the model can correct itself.
    ///
    /// When a response carries several capability calls only the first is
    /// executed and the rest are dropped with a warning.
    pub async fn run(
        &self,
        session: &mut Session,
        prompt: &str,
    ) -> Result<Vec<OutputItem>, ModelServiceError> {
        let session_id = session.id();
        session.push(Turn::user_text(prompt));
        let mut outputs = Vec::new();

        for iteration in 1..=self.max_iterations {
            let response = self
                .model
                .generate(ModelRequest {
                    history: session.turns(),
                    instruction: &self.instruction,
                    capabilities: &self.capabilities,
                })
                .await
                .map_err(|error| {
                    error!(%session_id, iteration, %error, "model service failed; aborting generation");
                    error
                })?;

            let mut calls = response.calls.into_iter();
            let Some(call) = calls.next() else {
                if let Some(text) = response
                    .text
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                {
                    session.push(Turn::model_text(text.clone()));
                    outputs.push(OutputItem::text(text));
                }
                info!(%session_id, iteration, steps = outputs.len(), "generation finished");
                return Ok(outputs);
            };

            let dropped = calls.count();
            if dropped > 0 {
                warn!(
                    %session_id,
                    iteration,
                    dropped,
                    "model requested several capability calls; executing only the first"
                );
            }

            let (command, result) = self.dispatch(&call).await;
            info!(%session_id, iteration, %command, status = result.status.tag(), "capability call handled");
            session.push(Turn::model_call(call.clone()));
            session.push(Turn::call_result(call.name, result.to_string()));
            outputs.push(OutputItem::command(command, result));
        }

        warn!(%session_id, max_iterations = self.max_iterations, "generation hit the iteration cap");
        outputs.push(OutputItem::text(format!(
            "Stopped after {} tool calls without a final answer from the model.",
            self.max_iterations
        )));
        Ok(outputs)
    }

    async fn dispatch(&self, call: &CapabilityCall) -> (String, CommandResult) {
        if call.name != EXECUTE_COMMAND {
            return (
                format!("{}({})", call.name, call.args),
                CommandResult::failure(format!(
                    "unknown capability `{}`; only `{EXECUTE_COMMAND}` is available",
                    call.name
                )),
            );
        }
        match call.command_arg() {
            Some(command) => (command.to_string(), self.interpreter.execute(command).await),
            None => (
                format!("{}({})", call.name, call.args),
                CommandResult::failure("missing string argument `command`"),
            ),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
