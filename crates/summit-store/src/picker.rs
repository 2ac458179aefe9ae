//! Folder selection capability.
//!
//! The directory picker is a platform capability: the host prompts the user
//! and either grants a [`FolderHandle`] or denies access. The handle is the
//! only way into the selected directory and is exclusively owned by the
//! [`DocumentStore`](crate::DocumentStore) for the session lifetime.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use summit_core::{Result, SummitError};

/// Opaque capability granting read/write/create access to a user-selected
/// directory and its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHandle {
    root: PathBuf,
}

impl FolderHandle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Platform prompt for selecting a directory.
///
/// Implementations surface denial or cancellation as
/// [`SummitError::AccessDenied`]; the caller presents the retry affordance,
/// never the picker itself.
#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick(&self) -> Result<FolderHandle>;
}

/// Scripted picker for tests: grants a fixed path or denies every prompt.
#[derive(Debug, Clone)]
pub struct MockFolderPicker {
    path: Option<PathBuf>,
}

impl MockFolderPicker {
    pub fn granting(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn denying() -> Self {
        Self { path: None }
    }
}

#[async_trait]
impl FolderPicker for MockFolderPicker {
    async fn pick(&self) -> Result<FolderHandle> {
        match &self.path {
            Some(path) => Ok(FolderHandle::new(path.clone())),
            None => Err(SummitError::AccessDenied(
                "folder selection refused".to_string(),
            )),
        }
    }
}
