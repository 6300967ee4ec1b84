use chrono::{DateTime, Utc};
use interpreter::Command;
use shared::{domain::FileEntry, protocol::OutputItem};
use tracing::{debug, warn};

use crate::{
    preview::{Compositor, Selection},
    tree::{ExpandedFolders, FileTree, TreeError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    User,
    Command,
    Result,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Editor language for a file, by extension.
pub fn language_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "html",
        "css" => "css",
        "js" => "javascript",
        "ts" => "typescript",
        "json" => "json",
        "md" => "markdown",
        _ => "plaintext",
    }
}

/// Client-side state of one project: the file tree, which folders are
/// open, the file being edited and the activity log.
#[derive(Debug, Default)]
pub struct ProjectView {
    tree: FileTree,
    expanded: ExpandedFolders,
    selection: Option<Selection>,
    log: Vec<LogEntry>,
}

impl ProjectView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn expanded(&self) -> &ExpandedFolders {
        &self.expanded
    }

    pub fn expanded_mut(&mut self) -> &mut ExpandedFolders {
        &mut self.expanded
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn push_log(&mut self, kind: LogKind, content: impl Into<String>) {
        self.log.push(LogEntry {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// Replaces the tree with the server's listing. The selection survives
    /// when its file still exists.
    pub fn hydrate(&mut self, entries: &[FileEntry]) -> Result<(), TreeError> {
        self.tree = FileTree::hydrate(entries)?;
        if let Some(selection) = &self.selection {
            match self.tree.lookup(&selection.path) {
                Some(content) => {
                    let path = selection.path.clone();
                    self.selection = Some(Selection::new(path, content));
                }
                None => self.selection = None,
            }
        }
        debug!(files = self.tree.file_count(), "project hydrated");
        Ok(())
    }

    /// Logs every step of a generation run and mirrors successful writes
    /// into the tree. Written HTML files, or the first write when nothing
    /// is selected, become the selection.
    pub fn apply_output(&mut self, items: &[OutputItem]) {
        for item in items {
            match item {
                OutputItem::Command { command, result } => {
                    self.push_log(LogKind::Command, command.clone());
                    self.push_log(LogKind::Result, result.to_string());
                    if !result.is_success() {
                        continue;
                    }
                    if let Ok(Command::Write { path, content }) = Command::parse(command) {
                        let path = path.to_string();
                        if let Err(error) = self.record_write(&path, &content) {
                            warn!(%path, %error, "generated file does not fit the tree");
                            self.push_log(LogKind::Result, format!("failure: {error}"));
                        }
                    }
                }
                OutputItem::Text { text } => self.push_log(LogKind::Ai, text.clone()),
            }
        }
    }

    fn record_write(&mut self, path: &str, content: &str) -> Result<(), TreeError> {
        self.tree.insert(path, content)?;
        self.expanded.reveal(path);
        let html = language_for(path) == "html";
        if self.selection.is_none() || html {
            self.selection = Some(Selection::new(path, content));
        }
        Ok(())
    }

    /// Opens a file in the editor; `false` when no such file exists.
    pub fn select(&mut self, path: &str) -> bool {
        match self.tree.lookup(path) {
            Some(content) => {
                self.selection = Some(Selection::new(path, content));
                true
            }
            None => false,
        }
    }

    /// Stores an edit in the tree, keeping the selection's live content in
    /// step when it is the edited file.
    pub fn edit_file(&mut self, path: &str, content: &str) -> Result<(), TreeError> {
        self.tree.insert(path, content)?;
        if let Some(selection) = self.selection.as_mut().filter(|s| s.path == path) {
            selection.live_content = content.to_string();
        }
        Ok(())
    }

    pub fn preview(&self, compositor: &dyn Compositor) -> String {
        compositor.compose(&self.tree, self.selection.as_ref())
    }
}

#[cfg(test)]
#[path = "tests/project_tests.rs"]
mod tests;
