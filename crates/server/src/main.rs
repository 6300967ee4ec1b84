use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{GenerateRequest, GenerateResponse, ListFilesResponse, PublishRequest, PublishResponse},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
#[cfg(test)]
mod test_support;

use app_state::AppState;
use config::load_settings;

const MAX_REQUEST_BYTES: usize = 1024 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let state = AppState::from_settings(&settings).await.map_err(|error| {
        error!(
            project_root = %settings.project_root.display(),
            %error,
            "failed to prepare project root; verify the path is writable"
        );
        error
    })?;
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        project_root = %settings.project_root.display(),
        model = %settings.model_name,
        auto_deploy = settings.auto_deploy,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/generate", post(http_generate))
        .route("/api/files", get(http_list_files))
        .route("/api/publish", post(http_publish))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ModelService | ErrorCode::DeploymentRejected => StatusCode::BAD_GATEWAY,
        ErrorCode::DeploymentToolUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::DeploymentTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn http_error(error: ApiError) -> HttpError {
    (status_for(error.code), Json(error))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, HttpError> {
    let response = api::generate(&state.api, &req.prompt)
        .await
        .map_err(http_error)?;
    Ok(Json(response))
}

async fn http_list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListFilesResponse>, HttpError> {
    let response = api::list_files(&state.api).await.map_err(http_error)?;
    Ok(Json(response))
}

async fn http_publish(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, HttpError> {
    let response = api::publish(&state.api, &req.folder_name)
        .await
        .map_err(|error| {
            error!(folder = %req.folder_name, code = ?error.code, message = %error.message, "publish failed");
            http_error(error)
        })?;
    Ok(Json(response))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
