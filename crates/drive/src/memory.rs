use std::{
    collections::HashSet,
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    Result,
    error::Context,
    store::{CloudFileStore, NewFile, StoredFile},
};

/// A file held by [`MemoryFileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    pub id: String,
    pub file: NewFile,
    pub bytes: Vec<u8>,
}

/// Process-local file store.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Mutex<Vec<MemoryFile>>,
    public: Mutex<HashSet<String>>,
    next_id: AtomicU64,
}

impl MemoryFileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn files(&self) -> Vec<MemoryFile> {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[must_use]
    pub fn is_public(&self, id: &str) -> bool {
        self.public
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }
}

#[async_trait]
impl CloudFileStore for MemoryFileStore {
    async fn upload(&self, file: &NewFile, path: &Path) -> Result<StoredFile> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let link = format!("memory://{}/{}", file.parent_folder, file.title);
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MemoryFile {
                id: id.clone(),
                file: file.clone(),
                bytes,
            });
        Ok(StoredFile { id, link })
    }

    async fn set_public(&self, id: &str) -> Result<()> {
        self.public
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
        Ok(())
    }
}
