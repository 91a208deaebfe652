//! Per-invocation scratch directories
//!
//! Manages creation, use, and removal of the temporary directory that holds a
//! submission's source file and compiler artifacts.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use crate::sandbox::SandboxError;

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "assayer-";

/// A uniquely named scratch directory owned by one invocation
///
/// # Cleanup
///
/// Call [`close()`](Self::close) to remove the directory and observe the
/// outcome. If the workspace is dropped instead (for example because the
/// owning future was cancelled), the directory is still removed, but any
/// error is swallowed and a warning is logged.
#[derive(Debug)]
pub struct Workspace {
    /// Backing directory; `None` once closed
    dir: Option<TempDir>,

    /// Directory name, unique under the scratch root
    id: String,

    /// Absolute path to the directory
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `root`, creating `root` if needed
    #[instrument]
    pub async fn create(root: &Path) -> Result<Self, SandboxError> {
        let create_err = |source| SandboxError::WorkspaceCreate {
            root: root.to_path_buf(),
            source,
        };

        tokio::fs::create_dir_all(root).await.map_err(create_err)?;

        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(create_err)?;

        let path = dir.path().to_path_buf();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(%id, ?path, "workspace created");

        Ok(Self {
            dir: Some(dir),
            id,
            path,
        })
    }

    /// Get the workspace ID (the directory name)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the host path to a file inside the workspace
    ///
    /// Returns an error if the path contains path traversal attempts.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, SandboxError> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return Err(SandboxError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.path.join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content), fields(workspace = %self.id))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<(), SandboxError> {
        let path = self.file_path(name)?;
        tokio::fs::write(&path, content).await?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(())
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, SandboxError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Remove the workspace and everything in it
    #[must_use = "cleanup errors should be handled"]
    #[instrument(skip(self), fields(workspace = %self.id))]
    pub async fn close(mut self) -> Result<(), SandboxError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };

        let path = self.path.clone();
        let removed = tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|result| result);

        match removed {
            Ok(()) => {
                debug!("workspace removed");
                Ok(())
            }
            Err(source) => {
                warn!(?path, error = %source, "failed to remove workspace");
                Err(SandboxError::WorkspaceCleanup { path, source })
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.dir.is_some() {
            warn!(
                workspace = %self.id,
                path = %self.path.display(),
                "Workspace dropped without explicit close, removing it now"
            );
        }
    }
}
