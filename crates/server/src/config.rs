use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub project_root: PathBuf,
    pub gemini_api_key: Option<String>,
    pub model_name: String,
    pub model_base_url: Option<String>,
    pub model_timeout_seconds: u64,
    pub max_tool_iterations: usize,
    pub command_timeout_seconds: u64,
    pub vercel_token: Option<String>,
    pub deploy_timeout_seconds: u64,
    pub auto_deploy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3001".into(),
            project_root: PathBuf::from("./server"),
            gemini_api_key: None,
            model_name: agent::gemini::DEFAULT_MODEL.into(),
            model_base_url: None,
            model_timeout_seconds: agent::gemini::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_tool_iterations: agent::DEFAULT_MAX_ITERATIONS,
            command_timeout_seconds: 60,
            vercel_token: None,
            deploy_timeout_seconds: deploy::DEFAULT_DEPLOY_TIMEOUT.as_secs(),
            auto_deploy: true,
        }
    }
}

impl Settings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_seconds)
    }

    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout_seconds)
    }
}

/// Optional `server.toml`; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    project_root: Option<PathBuf>,
    gemini_api_key: Option<String>,
    model_name: Option<String>,
    model_base_url: Option<String>,
    model_timeout_seconds: Option<u64>,
    max_tool_iterations: Option<usize>,
    command_timeout_seconds: Option<u64>,
    vercel_token: Option<String>,
    deploy_timeout_seconds: Option<u64>,
    auto_deploy: Option<bool>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(cfg) => cfg,
        Err(error) => {
            warn!(%error, "ignoring unreadable server.toml");
            return;
        }
    };

    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.project_root {
        settings.project_root = v;
    }
    if file_cfg.gemini_api_key.is_some() {
        settings.gemini_api_key = file_cfg.gemini_api_key;
    }
    if let Some(v) = file_cfg.model_name {
        settings.model_name = v;
    }
    if file_cfg.model_base_url.is_some() {
        settings.model_base_url = file_cfg.model_base_url;
    }
    if let Some(v) = file_cfg.model_timeout_seconds {
        settings.model_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.max_tool_iterations {
        settings.max_tool_iterations = v;
    }
    if let Some(v) = file_cfg.command_timeout_seconds {
        settings.command_timeout_seconds = v;
    }
    if file_cfg.vercel_token.is_some() {
        settings.vercel_token = file_cfg.vercel_token;
    }
    if let Some(v) = file_cfg.deploy_timeout_seconds {
        settings.deploy_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.auto_deploy {
        settings.auto_deploy = v;
    }
}

/// Plain names first, then their `APP__` aliases, so the alias wins.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |plain: &str, alias: &str| lookup(alias).or_else(|| lookup(plain));

    if let Some(port) = lookup("PORT") {
        settings.server_bind = format!("0.0.0.0:{port}");
    }
    if let Some(v) = var("SERVER_BIND", "APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = var("PROJECT_ROOT", "APP__PROJECT_ROOT") {
        settings.project_root = PathBuf::from(v);
    }
    if let Some(v) = var("GEMINI_API_KEY", "APP__GEMINI_API_KEY") {
        settings.gemini_api_key = Some(v);
    }
    if let Some(v) = var("MODEL_NAME", "APP__MODEL_NAME") {
        settings.model_name = v;
    }
    if let Some(v) = var("MODEL_BASE_URL", "APP__MODEL_BASE_URL") {
        settings.model_base_url = Some(v);
    }
    if let Some(v) = var("MODEL_TIMEOUT_SECONDS", "APP__MODEL_TIMEOUT_SECONDS") {
        parse_into(&mut settings.model_timeout_seconds, "MODEL_TIMEOUT_SECONDS", &v);
    }
    if let Some(v) = var("MAX_TOOL_ITERATIONS", "APP__MAX_TOOL_ITERATIONS") {
        parse_into(&mut settings.max_tool_iterations, "MAX_TOOL_ITERATIONS", &v);
    }
    if let Some(v) = var("COMMAND_TIMEOUT_SECONDS", "APP__COMMAND_TIMEOUT_SECONDS") {
        parse_into(&mut settings.command_timeout_seconds, "COMMAND_TIMEOUT_SECONDS", &v);
    }
    if let Some(v) = var("VERCEL_TOKEN", "APP__VERCEL_TOKEN") {
        settings.vercel_token = Some(v);
    }
    if let Some(v) = var("DEPLOY_TIMEOUT_SECONDS", "APP__DEPLOY_TIMEOUT_SECONDS") {
        parse_into(&mut settings.deploy_timeout_seconds, "DEPLOY_TIMEOUT_SECONDS", &v);
    }
    if let Some(v) = var("AUTO_DEPLOY", "APP__AUTO_DEPLOY") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => settings.auto_deploy = true,
            "0" | "false" | "no" | "off" => settings.auto_deploy = false,
            _ => warn!(value = %v, "ignoring unrecognised AUTO_DEPLOY"),
        }
    }
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value = %raw, "ignoring non-numeric setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
