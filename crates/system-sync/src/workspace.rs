//! Operation-scoped temporary workspace.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Temporary directory owning all intermediate artifacts of one sync
/// operation.
///
/// Each operation creates its own workspace; directories are never shared
/// or reused across operations. The directory is removed when the guard
/// drops, on success and failure paths alike; removal failures are logged
/// and swallowed.
#[derive(Debug)]
pub struct SyncWorkspace {
    path: PathBuf,
}

impl SyncWorkspace {
    /// Create a uniquely named workspace under the system temp directory.
    pub fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("palanque_sync_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        debug!("[SystemSync] Created workspace {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of an artifact inside this workspace.
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for SyncWorkspace {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "[SystemSync] Failed to remove workspace {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}
