use std::path::Path;

use {async_trait::async_trait, serde_json::Value};

use crate::Result;

#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Post a block-kit message to `channel`.
    async fn post_message(&self, channel: &str, blocks: Vec<Value>) -> Result<()>;

    /// Share the file at `path` in `channel` with `caption` as its comment.
    async fn post_file(&self, channel: &str, path: &Path, title: &str, caption: &str)
    -> Result<()>;
}
