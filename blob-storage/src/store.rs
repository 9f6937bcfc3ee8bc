use std::io;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use crate::address::VideoKey;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid {field}: {reason}")]
    InvalidKey { field: &'static str, reason: String },

    #[error("no video stored at {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A video that exists at its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVideo {
    pub path: PathBuf,
    pub size: u64,
}

/// An upload in progress, written to a private staging file until it is
/// committed to its address or discarded.
///
/// The staging file is removed when the blob is dropped uncommitted, so a
/// cancelled request cleans up after itself.
#[derive(Debug)]
pub struct StagedBlob {
    file: File,
    path: TempPath,
    size: u64,
}

impl StagedBlob {
    pub(crate) fn new(file: File, path: TempPath) -> Self {
        Self { file, path, size: 0 }
    }

    pub async fn write_chunk(&mut self, data: &[u8]) -> StoreResult<()> {
        self.file.write_all(data).await?;
        self.size += data.len() as u64;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Flushes and closes the staging file. The returned path still deletes
    /// the file on drop until it is kept.
    pub(crate) async fn seal(mut self) -> StoreResult<(TempPath, u64)> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok((self.path, self.size))
    }

    pub(crate) fn into_temp_path(self) -> TempPath {
        self.path
    }
}

/// Storage addressed by [`VideoKey`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn base_dir(&self) -> &Path;

    /// Opens a fresh staging file for an incoming upload.
    async fn stage(&self) -> StoreResult<StagedBlob>;

    /// Moves a staged upload to the address of `key`, replacing whatever was there.
    async fn commit(&self, staged: StagedBlob, key: &VideoKey) -> StoreResult<StoredVideo>;

    async fn discard(&self, staged: StagedBlob) -> StoreResult<()>;

    /// Returns the stored video for `key`, or [`StoreError::NotFound`].
    async fn locate(&self, key: &VideoKey) -> StoreResult<StoredVideo>;

    async fn put_video(&self, key: &VideoKey, data: &[u8]) -> StoreResult<StoredVideo> {
        let mut staged = self.stage().await?;
        if let Err(e) = staged.write_chunk(data).await {
            self.discard(staged).await?;
            return Err(e);
        }
        self.commit(staged, key).await
    }

    async fn read_video(&self, key: &VideoKey) -> StoreResult<Vec<u8>> {
        let stored = self.locate(key).await?;
        Ok(tokio::fs::read(stored.path).await?)
    }
}
