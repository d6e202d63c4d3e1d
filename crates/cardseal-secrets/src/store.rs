//! Shared storage for sealed blobs.
//!
//! Defines the [`BlobStore`] trait and [`SharedBlobStore`], which keeps each
//! artifact as a file inside a group container directory resolved by a
//! [`ContainerResolver`]. Writes replace the artifact atomically, so a
//! reader in another process sees either the previous blob or the new one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cardseal_core::paths;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Result, SealError};

/// Maps a group identifier to a directory both processes can reach.
pub trait ContainerResolver: Send + Sync {
    /// Resolve the container for `group_id`, or fail with
    /// [`SealError::ContainerUnavailable`].
    fn resolve(&self, group_id: &str) -> Result<PathBuf>;
}

/// Resolves `{root}/{group_id}`.
///
/// The root must already exist; a missing root means the installation was
/// never provisioned. The group directory itself is created on first write.
pub struct DirectoryContainerResolver {
    root: PathBuf,
}

impl DirectoryContainerResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ContainerResolver for DirectoryContainerResolver {
    fn resolve(&self, group_id: &str) -> Result<PathBuf> {
        paths::validate_component(group_id).map_err(|e| {
            SealError::ContainerUnavailable(format!("invalid group id: {e}"))
        })?;
        if !self.root.is_dir() {
            warn!(root = %self.root.display(), "container root is missing");
            return Err(SealError::ContainerUnavailable(format!(
                "container root {} does not exist or is not a directory",
                self.root.display()
            )));
        }
        Ok(self.root.join(group_id))
    }
}

/// Async trait for sealed-blob storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Replace the artifact `name` in the `group_id` container with `bytes`.
    async fn write(&self, group_id: &str, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read the artifact `name`, failing with [`SealError::NotFound`] when
    /// it has never been written.
    async fn read(&self, group_id: &str, name: &str) -> Result<Vec<u8>>;
}

/// A file-system-backed blob store over group containers.
///
/// Artifacts live at `{container}/{name}` with mode `0600`; containers are
/// created with mode `0700` on Unix.
pub struct SharedBlobStore {
    resolver: Arc<dyn ContainerResolver>,
}

impl SharedBlobStore {
    pub fn new(resolver: Arc<dyn ContainerResolver>) -> Self {
        Self { resolver }
    }

    /// Store rooted at a plain directory of group containers.
    pub fn with_root(root: PathBuf) -> Self {
        Self::new(Arc::new(DirectoryContainerResolver::new(root)))
    }

    fn artifact_path(&self, group_id: &str, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.resolver.resolve(group_id)?.join(name))
    }
}

fn validate_name(name: &str) -> Result<()> {
    paths::validate_component(name)
        .map_err(|e| SealError::InvalidInput(format!("artifact name {e}")))
}

/// Ensure the container directory exists with restrictive permissions.
async fn ensure_container(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        tokio::fs::set_permissions(dir, perms).await?;
    }

    Ok(())
}

/// Write `data` to a fresh file at `path` with mode 0600 on Unix, flushed
/// to disk before returning.
async fn write_new_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl BlobStore for SharedBlobStore {
    async fn write(&self, group_id: &str, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.artifact_path(group_id, name)?;
        let container = path
            .parent()
            .ok_or_else(|| SealError::ContainerUnavailable(path.display().to_string()))?;
        ensure_container(container).await?;

        let tmp = container.join(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()));
        let replaced = match write_new_file(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await.map_err(SealError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = replaced {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        debug!(group = group_id, name, path = %path.display(), len = bytes.len(), "wrote sealed blob");
        Ok(())
    }

    async fn read(&self, group_id: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.artifact_path(group_id, name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(group = group_id, name, len = bytes.len(), "read sealed blob");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SealError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
