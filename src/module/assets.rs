//! Filesystem-backed archive store
//!
//! Reads binary archives from disk. Asynchronous loads run on the tokio blocking-I/O
//! machinery and never block the caller.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::module::traits::{ArchiveHandle, ArchiveRequest, AssetStore, ModError};

/// Loads archives straight from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAssetStore;

impl FileAssetStore {
    pub fn new() -> Self {
        Self
    }

    fn slice(path: PathBuf, data: Vec<u8>, offset: u64) -> Result<ArchiveHandle, ModError> {
        let offset = usize::try_from(offset)
            .ok()
            .filter(|&o| o <= data.len())
            .ok_or_else(|| {
                ModError::Asset(format!(
                    "Offset {} is past the end of {:?} ({} bytes)",
                    offset,
                    path,
                    data.len()
                ))
            })?;
        let data = Bytes::from(data).slice(offset..);
        Ok(ArchiveHandle { path, data })
    }
}

impl AssetStore for FileAssetStore {
    fn load_archive(&self, path: &Path, offset: u64) -> Result<ArchiveHandle, ModError> {
        debug!("Loading archive {:?}", path);
        let data = std::fs::read(path)
            .map_err(|e| ModError::Asset(format!("Failed to read archive {:?}: {}", path, e)))?;
        Self::slice(path.to_path_buf(), data, offset)
    }

    fn load_archive_async(&self, path: PathBuf, offset: u64) -> ArchiveRequest {
        Box::pin(async move {
            debug!("Loading archive {:?} asynchronously", path);
            let data = tokio::fs::read(&path).await.map_err(|e| {
                ModError::Asset(format!("Failed to read archive {:?}: {}", path, e))
            })?;
            Self::slice(path, data, offset)
        })
    }
}
