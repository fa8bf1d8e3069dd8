use std::path::Path;

use async_trait::async_trait;

use crate::Result;

/// Metadata for a file about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub title: String,
    pub content_type: String,
    /// Folder id the file is created in.
    pub parent_folder: String,
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub id: String,
    /// Shareable link to the file.
    pub link: String,
}

#[async_trait]
pub trait CloudFileStore: Send + Sync {
    /// Upload the contents of `path` as `file`.
    async fn upload(&self, file: &NewFile, path: &Path) -> Result<StoredFile>;

    /// Grant read access to anyone with the link.
    async fn set_public(&self, id: &str) -> Result<()>;
}
