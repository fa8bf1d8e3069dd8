//! Slack Web API implementation of [`ChatNotifier`].

use std::{path::Path, time::Duration};

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::{debug, info, warn},
};

use crate::{Error, Result, error::Context, notifier::ChatNotifier};

/// Plain-text fallback shown in notifications for block messages.
const FALLBACK_TEXT: &str = "New photo received by SMS";

#[derive(Debug, Clone)]
pub struct SlackOptions {
    pub bot_token: Secret<String>,
    /// Web API root, e.g. `https://slack.com/api`.
    pub api_url: String,
    pub timeout: Duration,
}

pub struct SlackNotifier {
    http: reqwest::Client,
    bot_token: Secret<String>,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: String,
    file_id: String,
}

impl SlackNotifier {
    pub fn new(options: SlackOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::external("failed to build slack http client", e))?;
        Ok(Self {
            http,
            bot_token: options.bot_token,
            api_url: options.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_url)
    }

    /// Send a Web API request and return the body of an `ok: true` reply.
    async fn call(&self, method: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let resp = request
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::external(format!("slack {method} request failed"), e))?;
        if !resp.status().is_success() {
            return Err(Error::Http {
                method: method.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp
            .json::<Value>()
            .await
            .with_context(|| format!("invalid slack {method} response"))?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(Error::Api {
                method: method.to_string(),
                error,
            });
        }
        if let Some(warning) = body.get("warning").and_then(Value::as_str) {
            debug!(method, warning, "slack api warning");
        }
        Ok(body)
    }

    async fn call_json(&self, method: &str, payload: &Value) -> Result<Value> {
        let request = self.http.post(self.method_url(method)).json(payload);
        self.call(method, request).await
    }

    async fn join(&self, channel: &str) -> Result<()> {
        match self
            .call_json("conversations.join", &json!({ "channel": channel }))
            .await
        {
            Ok(_) => Ok(()),
            // Private channels and DMs cannot be joined; the upload may still
            // succeed if the bot is already a member.
            Err(Error::Api { error, .. }) => {
                warn!(channel, error = %error, "could not join slack channel");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ChatNotifier for SlackNotifier {
    async fn post_message(&self, channel: &str, blocks: Vec<Value>) -> Result<()> {
        let payload = json!({
            "channel": channel,
            "text": FALLBACK_TEXT,
            "blocks": blocks,
        });
        self.call_json("chat.postMessage", &payload).await?;
        info!(channel, "posted slack message");
        Ok(())
    }

    async fn post_file(
        &self,
        channel: &str,
        path: &Path,
        title: &str,
        caption: &str,
    ) -> Result<()> {
        self.join(channel).await?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let length = bytes.len().to_string();
        let request = self
            .http
            .post(self.method_url("files.getUploadURLExternal"))
            .form(&[("filename", title), ("length", length.as_str())]);
        let ticket: UploadTicket = serde_json::from_value(
            self.call("files.getUploadURLExternal", request).await?,
        )
        .context("invalid files.getUploadURLExternal response")?;

        let resp = self
            .http
            .post(&ticket.upload_url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::external("slack file upload failed", e))?;
        if !resp.status().is_success() {
            return Err(Error::Http {
                method: "file upload".to_string(),
                status: resp.status().as_u16(),
            });
        }

        let payload = json!({
            "files": [{ "id": ticket.file_id, "title": title }],
            "channel_id": channel,
            "initial_comment": caption,
        });
        self.call_json("files.completeUploadExternal", &payload)
            .await?;
        info!(channel, file_id = %ticket.file_id, "shared file in slack");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, std::io::Write};

    fn notifier(server: &mockito::Server) -> SlackNotifier {
        SlackNotifier::new(SlackOptions {
            bot_token: Secret::new("xoxb-test".into()),
            api_url: server.url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn post_message_sends_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test")
            .match_body(Matcher::PartialJson(json!({
                "channel": "C123",
                "blocks": [{ "type": "image" }],
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"ts":"1.2"}"#)
            .create_async()
            .await;

        notifier(&server)
            .post_message("C123", vec![json!({ "type": "image" })])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn ok_false_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"channel_not_found"}"#)
            .create_async()
            .await;

        let err = notifier(&server)
            .post_message("C404", Vec::new())
            .await
            .unwrap_err();
        match err {
            Error::Api { method, error } => {
                assert_eq!(method, "chat.postMessage");
                assert_eq!(error, "channel_not_found");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn post_file_runs_external_upload_flow() {
        let mut server = mockito::Server::new_async().await;
        let join = server
            .mock("POST", "/conversations.join")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;
        let ticket = server
            .mock("POST", "/files.getUploadURLExternal")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filename".into(), "a.jpg".into()),
                Matcher::UrlEncoded("length".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"ok":true,"upload_url":"{}/upload/F1","file_id":"F1"}}"#,
                server.url()
            ))
            .create_async()
            .await;
        let upload = server
            .mock("POST", "/upload/F1")
            .match_body("bytes")
            .with_status(200)
            .with_body("OK - 5")
            .create_async()
            .await;
        let complete = server
            .mock("POST", "/files.completeUploadExternal")
            .match_body(Matcher::PartialJson(json!({
                "channel_id": "C123",
                "initial_comment": "hi\n<https://d/F|a.jpg> (Google Drive)",
                "files": [{ "id": "F1", "title": "a.jpg" }],
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"files":[{"id":"F1"}]}"#)
            .create_async()
            .await;

        let mut staged = tempfile::NamedTempFile::new().unwrap();
        staged.write_all(b"bytes").unwrap();
        notifier(&server)
            .post_file(
                "C123",
                staged.path(),
                "a.jpg",
                "hi\n<https://d/F|a.jpg> (Google Drive)",
            )
            .await
            .unwrap();

        join.assert_async().await;
        ticket.assert_async().await;
        upload.assert_async().await;
        complete.assert_async().await;
    }

    #[tokio::test]
    async fn join_refusal_does_not_stop_upload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/conversations.join")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"method_not_supported_for_channel_type"}"#)
            .create_async()
            .await;
        let ticket = server
            .mock("POST", "/files.getUploadURLExternal")
            .with_status(200)
            .with_body(format!(
                r#"{{"ok":true,"upload_url":"{}/upload/F2","file_id":"F2"}}"#,
                server.url()
            ))
            .create_async()
            .await;
        server
            .mock("POST", "/upload/F2")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("POST", "/files.completeUploadExternal")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let mut staged = tempfile::NamedTempFile::new().unwrap();
        staged.write_all(b"x").unwrap();
        notifier(&server)
            .post_file("G123", staged.path(), "b.png", "b.png")
            .await
            .unwrap();
        ticket.assert_async().await;
    }
}
