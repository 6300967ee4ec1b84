//! Client side of the studio: a typed HTTP client, the project's file tree
//! and preview, and the publish flow with its countdown.

pub mod client;
pub mod deploy;
pub mod preview;
pub mod project;
pub mod tree;

pub use client::{ClientError, StudioClient};
pub use deploy::{
    target_folder, DeploymentOrchestrator, DeploymentSnapshot, DeploymentStatus, PublishError,
    Publisher,
};
pub use preview::{Compositor, Selection, TextSpliceCompositor};
pub use project::{language_for, LogEntry, LogKind, ProjectView};
pub use tree::{ExpandedFolders, FileNode, FileTree, TreeError, TreeFile};
