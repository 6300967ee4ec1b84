//! In-memory projection of the project's files as nested folders.

use std::collections::BTreeSet;

use shared::domain::{FileEntry, NodeKind};
use thiserror::Error;

/// Nodes store only their own name. A node's full path is the `/`-joined
/// names from the root down to it. `FileTree::node` resolves it, and `files()`
/// and `render` rebuild it while walking, so it cannot drift from the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    File { name: String, content: String },
    Folder { name: String, children: Vec<FileNode> },
}

impl FileNode {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Folder { name, .. } => name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::File { .. } => NodeKind::File,
            Self::Folder { .. } => NodeKind::Folder,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::File { content, .. } => Some(content),
            Self::Folder { .. } => None,
        }
    }

    pub fn children(&self) -> &[FileNode] {
        match self {
            Self::File { .. } => &[],
            Self::Folder { children, .. } => children,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("path has no segments")]
    EmptyPath,
    #[error("`{path}` already exists and is not a {expected:?}")]
    KindConflict { path: String, expected: NodeKind },
}

/// A file reached by a pre-order walk, with its full `/`-joined path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile<'a> {
    pub path: String,
    pub content: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    roots: Vec<FileNode>,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn descend<'t>(
    level: &'t mut Vec<FileNode>,
    name: &str,
    prefix: &str,
) -> Result<&'t mut Vec<FileNode>, TreeError> {
    let index = match level.iter().position(|node| node.name() == name) {
        Some(index) => index,
        None => {
            level.push(FileNode::Folder {
                name: name.to_string(),
                children: Vec::new(),
            });
            level.len() - 1
        }
    };
    match &mut level[index] {
        FileNode::Folder { children, .. } => Ok(children),
        FileNode::File { .. } => Err(TreeError::KindConflict {
            path: prefix.to_string(),
            expected: NodeKind::Folder,
        }),
    }
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hydrate(entries: &[FileEntry]) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(&entry.path, &entry.content)?;
        }
        Ok(tree)
    }

    pub fn roots(&self) -> &[FileNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Creates missing folders in insertion order and writes the file,
    /// replacing any previous content. Inserting the same path twice is
    /// the same as inserting it once.
    pub fn insert(&mut self, path: &str, content: &str) -> Result<(), TreeError> {
        let parts = segments(path);
        let Some((file_name, folders)) = parts.split_last() else {
            return Err(TreeError::EmptyPath);
        };

        let mut level = &mut self.roots;
        let mut prefix = String::new();
        for folder in folders {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(folder);
            level = descend(level, folder, &prefix)?;
        }

        match level.iter_mut().find(|node| node.name() == *file_name) {
            Some(FileNode::File { content: existing, .. }) => {
                *existing = content.to_string();
                Ok(())
            }
            Some(FileNode::Folder { .. }) => Err(TreeError::KindConflict {
                path: parts.join("/"),
                expected: NodeKind::File,
            }),
            None => {
                level.push(FileNode::File {
                    name: file_name.to_string(),
                    content: content.to_string(),
                });
                Ok(())
            }
        }
    }

    pub fn node(&self, path: &str) -> Option<&FileNode> {
        let parts = segments(path);
        let (last, folders) = parts.split_last()?;
        let mut level = self.roots.as_slice();
        for folder in folders {
            level = level
                .iter()
                .find(|node| node.name() == *folder && node.kind() == NodeKind::Folder)?
                .children();
        }
        level.iter().find(|node| node.name() == *last)
    }

    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.node(path).and_then(FileNode::content)
    }

    /// Every file, parents before children, siblings in insertion order.
    pub fn files(&self) -> impl Iterator<Item = TreeFile<'_>> {
        let mut out = Vec::new();
        collect_files(&self.roots, "", &mut out);
        out.into_iter()
            .map(|(path, content)| TreeFile { path, content })
    }

    pub fn file_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_files(&self.roots, "", &mut out);
        out.into_iter().map(|(path, _)| path).collect()
    }

    pub fn file_count(&self) -> usize {
        fn count(nodes: &[FileNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    FileNode::File { .. } => 1,
                    FileNode::Folder { children, .. } => count(children),
                })
                .sum()
        }
        count(&self.roots)
    }

    /// Indented listing; collapsed folders hide their children.
    pub fn render(&self, expanded: &ExpandedFolders) -> String {
        let mut out = String::new();
        render_level(&self.roots, "", 0, expanded, &mut out);
        out
    }
}

fn collect_files<'a>(nodes: &'a [FileNode], prefix: &str, out: &mut Vec<(String, &'a str)>) {
    for node in nodes {
        let path = join(prefix, node.name());
        match node {
            FileNode::File { content, .. } => out.push((path, content)),
            FileNode::Folder { children, .. } => collect_files(children, &path, out),
        }
    }
}

fn render_level(
    nodes: &[FileNode],
    prefix: &str,
    depth: usize,
    expanded: &ExpandedFolders,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        let path = join(prefix, node.name());
        match node {
            FileNode::File { name, .. } => {
                out.push_str(&format!("{indent}  {name}\n"));
            }
            FileNode::Folder { name, children } => {
                let open = expanded.is_expanded(&path);
                let marker = if open { '-' } else { '+' };
                out.push_str(&format!("{indent}{marker} {name}/\n"));
                if open {
                    render_level(children, &path, depth + 1, expanded, out);
                }
            }
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Folders the user has opened, keyed by `/`-joined path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedFolders {
    paths: BTreeSet<String>,
}

impl ExpandedFolders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership and returns whether the folder is now open.
    pub fn toggle(&mut self, path: &str) -> bool {
        let key = normalize(path);
        if self.paths.remove(&key) {
            false
        } else {
            self.paths.insert(key);
            true
        }
    }

    pub fn expand(&mut self, path: &str) {
        let key = normalize(path);
        if !key.is_empty() {
            self.paths.insert(key);
        }
    }

    /// Opens every folder above a file so it becomes visible.
    pub fn reveal(&mut self, file_path: &str) {
        let parts = segments(file_path);
        for end in 1..parts.len() {
            self.expand(&parts[..end].join("/"));
        }
    }

    pub fn expand_all(&mut self, tree: &FileTree) {
        for path in tree.file_paths() {
            self.reveal(&path);
        }
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.paths.contains(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn normalize(path: &str) -> String {
    segments(path).join("/")
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
