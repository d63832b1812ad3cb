//! Directory-backed store with staged, rename-on-commit writes

use crate::content::Content;
use crate::error::{Result, StoreError};
use crate::key::{Key, KeyError};
use crate::store::ByteStore;
use async_trait::async_trait;
use futures::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

/// Directory under the root holding in-progress writes
const STAGING_DIR: &str = ".staging";

static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A store that keeps one file per key below a root directory
pub struct FsStore {
    root: PathBuf,
    staging: PathBuf,
}

impl FsStore {
    pub fn new(root: PathBuf) -> Self {
        let staging = root.join(STAGING_DIR);
        Self { root, staging }
    }

    /// Ensure the root and staging directories exist
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.staging).await?;
        info!(root = ?self.root, "File store initialized");
        Ok(())
    }

    fn path_for(&self, key: &Key) -> Result<PathBuf> {
        if key.segments()[0] == STAGING_DIR {
            return Err(KeyError::Segment(STAGING_DIR.to_string()).into());
        }
        Ok(self.root.join(key.to_relative_path()))
    }

    fn next_staging_path(&self) -> PathBuf {
        let n = STAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.staging.join(format!("{}-{}.part", std::process::id(), n))
    }

    /// Remove directories emptied by a delete, stopping at the root
    async fn prune_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// A staging file removed on drop unless it was renamed into place
struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            // Drop cannot await, so this one unlink runs inline on the caller's thread
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = ?self.path, error = %e, "Failed to remove staging file");
                }
            }
        }
    }
}

#[async_trait]
impl ByteStore for FsStore {
    async fn exists(&self, key: &Key) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, key: &Key) -> Result<Content> {
        let path = self.path_for(key)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if is_absent(&e) => return Err(StoreError::NotFound(key.clone())),
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StoreError::NotFound(key.clone()));
        }
        Ok(Content::from_stream(ReaderStream::new(file), Some(metadata.len())))
    }

    async fn write(&self, key: &Key, mut content: Content) -> Result<u64> {
        let target = self.path_for(key)?;
        fs::create_dir_all(&self.staging).await?;

        let mut staged = StagedFile {
            path: self.next_staging_path(),
            committed: false,
        };
        let mut file = fs::File::create(&staged.path).await?;
        let mut written = 0u64;
        while let Some(chunk) = content.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&staged.path, &target).await?;
        staged.committed = true;

        debug!(key = %key, size = written, "Stored blob");
        Ok(written)
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(StoreError::NotFound(key.clone())),
            Err(e) if is_absent(&e) => return Err(StoreError::NotFound(key.clone())),
            Err(e) => return Err(e.into()),
        }
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if is_absent(&e) => return Err(StoreError::NotFound(key.clone())),
            Err(e) => return Err(e.into()),
        }
        self.prune_empty_parents(&path).await;
        debug!(key = %key, "Deleted blob");
        Ok(())
    }
}
