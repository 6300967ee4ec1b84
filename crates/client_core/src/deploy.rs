use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};
use tracing::{info, warn};

pub const DEFAULT_ROOT_SEGMENT: &str = "server";
pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(60);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(240);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("select a file inside the site folder to publish")]
    NoTargetFolder,
    #[error("a deployment is already in progress")]
    AlreadyInFlight,
    #[error("folder not found: {0}")]
    FolderNotFound(String),
    #[error("deployment tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("deployment rejected: {0}")]
    Rejected(String),
    #[error("deployment timed out: {0}")]
    Timeout(String),
    #[error("could not reach the server: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deploys one top-level folder and returns its public URL.
    async fn publish(&self, folder: &str) -> Result<String, PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Idle,
    CountingDown,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSnapshot {
    pub status: DeploymentStatus,
    pub folder: Option<String>,
    pub remaining: Duration,
    pub url: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug)]
struct DeployState {
    status: DeploymentStatus,
    folder: Option<String>,
    started_at: Option<Instant>,
    url: Option<String>,
    reason: Option<String>,
}

/// First path segment, skipping `root_segment` when it leads and more
/// segments follow.
pub fn target_folder(selection_path: &str, root_segment: &str) -> Option<String> {
    let parts: Vec<&str> = selection_path.split('/').filter(|s| !s.is_empty()).collect();
    let folder = match parts.as_slice() {
        [first, second, ..] if *first == root_segment => second,
        [first, ..] => first,
        [] => return None,
    };
    Some(folder.to_string())
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs one publish at a time and exposes a countdown while it is out.
pub struct DeploymentOrchestrator {
    publisher: Arc<dyn Publisher>,
    root_segment: String,
    countdown: Duration,
    deadline: Duration,
    in_flight: AtomicBool,
    state: Mutex<DeployState>,
}

impl DeploymentOrchestrator {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            publisher,
            root_segment: DEFAULT_ROOT_SEGMENT.to_string(),
            countdown: DEFAULT_COUNTDOWN,
            deadline: DEFAULT_DEADLINE,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(DeployState {
                status: DeploymentStatus::Idle,
                folder: None,
                started_at: None,
                url: None,
                reason: None,
            }),
        }
    }

    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = countdown;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_root_segment(mut self, root_segment: impl Into<String>) -> Self {
        self.root_segment = root_segment.into();
        self
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> DeploymentSnapshot {
        let state = self.state.lock().await;
        let remaining = match (state.status, state.started_at) {
            (DeploymentStatus::CountingDown, Some(started)) => {
                self.countdown.saturating_sub(started.elapsed())
            }
            _ => Duration::ZERO,
        };
        DeploymentSnapshot {
            status: state.status,
            folder: state.folder.clone(),
            remaining,
            url: state.url.clone(),
            reason: state.reason.clone(),
        }
    }

    pub async fn publish(&self, selection_path: Option<&str>) -> Result<String, PublishError> {
        let folder = selection_path
            .and_then(|path| target_folder(path, &self.root_segment))
            .ok_or(PublishError::NoTargetFolder)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PublishError::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        {
            let mut state = self.state.lock().await;
            state.status = DeploymentStatus::CountingDown;
            state.folder = Some(folder.clone());
            state.started_at = Some(Instant::now());
            state.url = None;
            state.reason = None;
        }
        info!(%folder, countdown = ?self.countdown, "publish dispatched");

        let outcome = match tokio::time::timeout(self.deadline, self.publisher.publish(&folder)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(format!(
                "no response within {:?}",
                self.deadline
            ))),
        };

        let mut state = self.state.lock().await;
        match &outcome {
            Ok(url) => {
                info!(%folder, %url, "publish succeeded");
                state.status = DeploymentStatus::Succeeded;
                state.url = Some(url.clone());
            }
            Err(error) => {
                warn!(%folder, %error, "publish failed");
                state.status = DeploymentStatus::Failed;
                state.reason = Some(error.to_string());
            }
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/deploy_tests.rs"]
mod tests;
