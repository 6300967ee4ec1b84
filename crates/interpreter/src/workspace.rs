use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use shared::domain::FileEntry;
use thiserror::Error;
use tracing::debug;

use crate::command::ProjectPath;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("{op} failed for '{path}': {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("'{0}' exists and is not a directory")]
    NotADirectory(String),
}

impl WorkspaceError {
    fn io(op: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOutcome {
    Created,
    AlreadyExists,
}

/// Filesystem collaborator rooted at one project directory. Every path is a
/// [`ProjectPath`], so nothing above the root is reachable.
#[async_trait]
pub trait Workspace: Send + Sync {
    fn root(&self) -> &Path;
    async fn write_file(&self, path: &ProjectPath, content: &str) -> Result<(), WorkspaceError>;
    async fn create_dir_all(&self, path: &ProjectPath) -> Result<DirOutcome, WorkspaceError>;
    async fn read_file(&self, path: &ProjectPath) -> Result<String, WorkspaceError>;
    async fn is_dir(&self, path: &ProjectPath) -> bool;
    async fn list_files(&self) -> Result<Vec<FileEntry>, WorkspaceError>;
}

#[derive(Debug, Clone)]
pub struct DiskWorkspace {
    root: PathBuf,
}

impl DiskWorkspace {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| WorkspaceError::io("create root", root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn resolve(&self, path: &ProjectPath) -> PathBuf {
        self.root.join(path.to_relative_path())
    }
}

#[async_trait]
impl Workspace for DiskWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn write_file(&self, path: &ProjectPath, content: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WorkspaceError::io("create parent", path.to_string(), e))?;
        }
        tokio::fs::write(&target, content)
            .await
            .map_err(|e| WorkspaceError::io("write", path.to_string(), e))
    }

    async fn create_dir_all(&self, path: &ProjectPath) -> Result<DirOutcome, WorkspaceError> {
        let target = self.resolve(path);
        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_dir() => return Ok(DirOutcome::AlreadyExists),
            Ok(_) => return Err(WorkspaceError::NotADirectory(path.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(WorkspaceError::io("stat", path.to_string(), e)),
        }
        tokio::fs::create_dir_all(&target)
            .await
            .map_err(|e| WorkspaceError::io("mkdir", path.to_string(), e))?;
        Ok(DirOutcome::Created)
    }

    async fn read_file(&self, path: &ProjectPath) -> Result<String, WorkspaceError> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|e| WorkspaceError::io("read", path.to_string(), e))
    }

    async fn is_dir(&self, path: &ProjectPath) -> bool {
        tokio::fs::metadata(self.resolve(path))
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    async fn list_files(&self) -> Result<Vec<FileEntry>, WorkspaceError> {
        let mut files = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| WorkspaceError::io("read dir", dir.display().to_string(), e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| WorkspaceError::io("read dir", dir.display().to_string(), e))?
            {
                let name = entry.file_name().to_string_lossy().to_string();
                let relative = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}/{name}")
                };
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(error) => {
                        debug!(path = %relative, %error, "skipping entry with unreadable type");
                        continue;
                    }
                };
                if file_type.is_dir() {
                    pending.push((entry.path(), relative));
                } else if file_type.is_file() {
                    match tokio::fs::read_to_string(entry.path()).await {
                        Ok(content) => files.push(FileEntry {
                            path: relative,
                            content,
                        }),
                        Err(error) => debug!(path = %relative, %error, "skipping unreadable file"),
                    }
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
