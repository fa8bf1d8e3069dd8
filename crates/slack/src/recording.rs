use std::{path::Path, sync::Mutex};

use {async_trait::async_trait, serde_json::Value};

use crate::{Result, error::Context, notifier::ChatNotifier};

/// A post captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Message {
        channel: String,
        blocks: Vec<Value>,
    },
    File {
        channel: String,
        title: String,
        caption: String,
        size: u64,
    },
}

/// Notifier that keeps every post in memory instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    posts: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn posts(&self) -> Vec<Notification> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, notification: Notification) {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn post_message(&self, channel: &str, blocks: Vec<Value>) -> Result<()> {
        self.push(Notification::Message {
            channel: channel.to_string(),
            blocks,
        });
        Ok(())
    }

    async fn post_file(
        &self,
        channel: &str,
        path: &Path,
        title: &str,
        caption: &str,
    ) -> Result<()> {
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        self.push(Notification::File {
            channel: channel.to_string(),
            title: title.to_string(),
            caption: caption.to_string(),
            size,
        });
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_messages_in_order() {
        let notifier = RecordingNotifier::new();
        notifier
            .post_message("C1", vec![serde_json::json!({ "type": "image" })])
            .await
            .unwrap();
        notifier.post_message("C2", Vec::new()).await.unwrap();

        let posts = notifier.posts();
        assert_eq!(posts.len(), 2);
        assert!(matches!(&posts[1], Notification::Message { channel, .. } if channel == "C2"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let notifier = RecordingNotifier::new();
        let result = notifier
            .post_file("C1", Path::new("/nonexistent/phoso.jpg"), "t", "c")
            .await;
        assert!(result.is_err());
        assert!(notifier.posts().is_empty());
    }
}
