use serde::{Deserialize, Serialize};

use crate::domain::{CommandResult, FileEntry};

/// One step of a generation run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputItem {
    Command {
        command: String,
        result: CommandResult,
    },
    Text {
        text: String,
    },
}

impl OutputItem {
    pub fn command(command: impl Into<String>, result: CommandResult) -> Self {
        Self::Command {
            command: command.into(),
            result,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub data: Vec<OutputItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub success: bool,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub folder_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    pub deployed_url: String,
}
