use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    model::{
        CapabilityCall, CapabilityDeclaration, ModelRequest, ModelResponse, ModelService,
        ModelServiceError,
    },
    session::{Part, Role, Turn},
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// `generateContent` adapter for the hosted Gemini API.
pub struct GeminiModelService {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiModelService {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bounds each `generateContent` call; an expired call is a transport error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    system_instruction: WireContent,
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    function_declarations: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<CapabilityCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
}

fn wire_turn(turn: &Turn) -> WireContent {
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
    };
    let parts = turn
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                ..WirePart::default()
            },
            Part::Call(call) => WirePart {
                function_call: Some(call.clone()),
                ..WirePart::default()
            },
            Part::CallResult { name, result } => WirePart {
                function_response: Some(WireFunctionResponse {
                    name: name.clone(),
                    response: json!({ "result": result }),
                }),
                ..WirePart::default()
            },
        })
        .collect();
    WireContent {
        role: Some(role.to_string()),
        parts,
    }
}

fn wire_declaration(declaration: &CapabilityDeclaration) -> Value {
    let properties: serde_json::Map<String, Value> = declaration
        .parameters
        .iter()
        .map(|param| {
            (
                param.name.to_string(),
                json!({ "type": "STRING", "description": param.description }),
            )
        })
        .collect();
    let required: Vec<&str> = declaration.parameters.iter().map(|p| p.name).collect();
    json!({
        "name": declaration.name,
        "description": declaration.description,
        "parameters": {
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        }
    })
}

fn build_request(request: &ModelRequest<'_>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.history.iter().map(wire_turn).collect(),
        system_instruction: WireContent {
            role: None,
            parts: vec![WirePart {
                text: Some(request.instruction.to_string()),
                ..WirePart::default()
            }],
        },
        tools: vec![WireTool {
            function_declarations: request.capabilities.iter().map(wire_declaration).collect(),
        }],
    }
}

fn into_model_response(body: GenerateContentResponse) -> Result<ModelResponse, ModelServiceError> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(ModelServiceError::EmptyResponse)?;

    let mut response = ModelResponse::default();
    let mut text = String::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(call) = part.function_call {
            response.calls.push(call);
        }
        if let Some(fragment) = part.text {
            text.push_str(&fragment);
        }
    }
    if !text.is_empty() {
        response.text = Some(text);
    }
    Ok(response)
}

#[async_trait]
impl ModelService for GeminiModelService {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelServiceError> {
        let payload = build_request(&request);
        debug!(model = %self.model, turns = payload.contents.len(), "calling generateContent");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ModelServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelServiceError::Decode(e.to_string()))?;
        into_model_response(body)
    }
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
