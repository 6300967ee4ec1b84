use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::FileEntry,
    error::{ApiError, ErrorCode},
    protocol::{GenerateRequest, GenerateResponse, ListFilesResponse, PublishRequest, PublishResponse},
};
use thiserror::Error;
use tracing::debug;

use crate::deploy::{PublishError, Publisher};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {}", error.message)]
    Api { status: u16, error: ApiError },
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// HTTP client for the studio server's `/api` routes.
#[derive(Debug, Clone)]
pub struct StudioClient {
    http: Client,
    server_url: String,
}

impl StudioClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.server_url))
            .json(&GenerateRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        read_json(response).await
    }

    pub async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/files", self.server_url))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let listing: ListFilesResponse = read_json(response).await?;
        Ok(listing.files)
    }

    pub async fn publish_folder(&self, folder_name: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/publish", self.server_url))
            .json(&PublishRequest {
                folder_name: folder_name.to_string(),
            })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let published: PublishResponse = read_json(response).await?;
        Ok(published.deployed_url)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), %body, "server returned an error");
    match serde_json::from_str::<ApiError>(&body) {
        Ok(error) => Err(ClientError::Api {
            status: status.as_u16(),
            error,
        }),
        Err(_) => Err(ClientError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

impl From<ClientError> for PublishError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Api { error, .. } => match error.code {
                ErrorCode::NotFound => Self::FolderNotFound(error.message),
                ErrorCode::DeploymentToolUnavailable => Self::ToolUnavailable(error.message),
                ErrorCode::DeploymentTimeout => Self::Timeout(error.message),
                _ => Self::Rejected(error.message),
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[async_trait]
impl Publisher for StudioClient {
    async fn publish(&self, folder: &str) -> Result<String, PublishError> {
        Ok(self.publish_folder(folder).await?)
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
