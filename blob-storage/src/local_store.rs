use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tempfile::Builder;
use tokio::fs::{self, File};
use tokio::task;
use crate::address::VideoKey;
use crate::store::{BlobStore, StagedBlob, StoreError, StoreResult, StoredVideo};

/// Hidden directory below the base path that receives uploads in flight.
/// Identifiers may not start with '.', so it never collides with a schema.
const STAGING_DIR: &str = ".staging";

const PART_EXTENSION: &str = "part";

#[derive(Clone, Debug)]
pub struct LocalFileBlobStore {
    base_path: PathBuf,
}

impl LocalFileBlobStore {
    /// Does not touch the filesystem; see [`LocalFileBlobStore::open`].
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    /// Creates the base and staging directories if needed and removes staging
    /// files left behind by a previous process.
    ///
    /// Assumes one process per base directory.
    pub async fn open(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(base_path);
        fs::create_dir_all(store.staging_dir()).await?;
        let removed = store.sweep_staging().await?;
        if removed > 0 {
            tracing::info!("removed {} stale staging file(s) from {}", removed, store.staging_dir().display());
        }
        Ok(store)
    }

    fn staging_dir(&self) -> PathBuf {
        self.base_path.join(STAGING_DIR)
    }

    async fn sweep_staging(&self) -> StoreResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(self.staging_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == PART_EXTENSION) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl BlobStore for LocalFileBlobStore {
    fn base_dir(&self) -> &Path {
        &self.base_path
    }

    async fn stage(&self) -> StoreResult<StagedBlob> {
        let dir = self.staging_dir();
        fs::create_dir_all(&dir).await?;
        let suffix = format!(".{}", PART_EXTENSION);
        let named = task::spawn_blocking(move || Builder::new().suffix(&suffix).tempfile_in(dir))
            .await
            .map_err(io::Error::other)??;
        let (file, path) = named.into_parts();
        Ok(StagedBlob::new(File::from_std(file), path))
    }

    async fn commit(&self, staged: StagedBlob, key: &VideoKey) -> StoreResult<StoredVideo> {
        // Any early return drops `staged_path`, which deletes the staging file.
        let (staged_path, size) = staged.seal().await?;
        let target = key.path_in(&self.base_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&staged_path, &target).await?;
        let _ = staged_path.keep();

        tracing::debug!("committed {} ({} bytes)", target.display(), size);
        Ok(StoredVideo { path: target, size })
    }

    async fn discard(&self, staged: StagedBlob) -> StoreResult<()> {
        match staged.into_temp_path().close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn locate(&self, key: &VideoKey) -> StoreResult<StoredVideo> {
        let path = key.path_in(&self.base_path);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(StoredVideo { path, size: meta.len() }),
            Ok(_) => Err(StoreError::NotFound(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path)),
            Err(e) => Err(e.into()),
        }
    }
}
