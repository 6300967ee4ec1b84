//! Publishes a generated site folder to a static hosting provider and
//! reports the public URL it was given.

use std::{path::Path, sync::OnceLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

pub mod vercel;

pub use vercel::VercelDeployer;

pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub url: String,
    pub output: String,
}

#[derive(Debug, Error)]
pub enum DeployError {
    /// The deployment CLI is missing and could not be installed.
    #[error("deployment tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("deployment rejected: {output}")]
    Rejected { output: String },
    #[error("deployment finished without a public URL: {output}")]
    NoUrl { output: String },
    #[error("deployment did not finish within {0:?}")]
    Timeout(Duration),
}

impl DeployError {
    pub fn is_tool_error(&self) -> bool {
        matches!(self, Self::ToolUnavailable(_))
    }
}

#[async_trait]
pub trait DeploymentService: Send + Sync {
    async fn deploy(&self, directory: &Path) -> Result<Deployment, DeployError>;
}

fn url_pattern() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>()\[\]]+"#).expect("static url pattern"))
}

/// First http(s) URL in `output` whose host ends with `host_suffix`.
/// Trailing sentence punctuation is not part of the URL.
pub fn extract_url(output: &str, host_suffix: &str) -> Option<String> {
    url_pattern().find_iter(output).find_map(|candidate| {
        let trimmed = candidate
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'));
        let parsed = url::Url::parse(trimmed).ok()?;
        let host = parsed.host_str()?;
        host.ends_with(host_suffix)
            .then(|| trimmed.trim_end_matches('/').to_string())
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
