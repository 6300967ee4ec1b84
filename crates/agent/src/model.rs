use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::session::Turn;

pub const EXECUTE_COMMAND: &str = "executeCommand";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl CapabilityCall {
    pub fn execute_command(command: impl Into<String>) -> Self {
        Self {
            name: EXECUTE_COMMAND.to_string(),
            args: serde_json::json!({ "command": command.into() }),
        }
    }

    pub fn command_arg(&self) -> Option<&str> {
        self.args.get("command").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityParameter {
    pub name: &'static str,
    pub description: &'static str,
}

/// A capability the model may call. Every parameter is a required string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<CapabilityParameter>,
}

impl CapabilityDeclaration {
    pub fn execute_command() -> Self {
        Self {
            name: EXECUTE_COMMAND,
            description: "Run shell commands to create folders and files",
            parameters: vec![CapabilityParameter {
                name: "command",
                description: r#"Shell command (mkdir folder, touch file, echo "..." > file)"#,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub history: &'a [Turn],
    pub instruction: &'a str,
    pub capabilities: &'a [CapabilityDeclaration],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub calls: Vec<CapabilityCall>,
    pub text: Option<String>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            calls: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn call(call: CapabilityCall) -> Self {
        Self {
            calls: vec![call],
            text: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelServiceError {
    #[error("model service request failed: {0}")]
    Transport(String),
    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model service response could not be decoded: {0}")]
    Decode(String),
    #[error("model service returned no candidates")]
    EmptyResponse,
}

#[async_trait]
pub trait ModelService: Send + Sync {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelServiceError>;
}
