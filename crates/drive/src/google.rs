//! Google Drive v3 implementation of [`CloudFileStore`].

use std::{path::Path, time::Duration};

use {
    async_trait::async_trait,
    reqwest::header::LOCATION,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::json,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    auth::{CachedAccessToken, OAuthCredentials, get_access_token},
    error::Context,
    store::{CloudFileStore, NewFile, StoredFile},
};

/// Suffix Drive appends to links created through the API.
const SDK_SUFFIX: &str = "?usp=drivesdk";

#[derive(Debug, Clone)]
pub struct GoogleDriveOptions {
    pub credentials: OAuthCredentials,
    /// Metadata API root, e.g. `https://www.googleapis.com/drive/v3`.
    pub api_url: String,
    /// Media upload root, e.g. `https://www.googleapis.com/upload/drive/v3`.
    pub upload_url: String,
    pub timeout: Duration,
}

pub struct GoogleDriveStore {
    http: reqwest::Client,
    credentials: OAuthCredentials,
    api_url: String,
    upload_url: String,
    token_cache: tokio::sync::Mutex<Option<CachedAccessToken>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    web_view_link: Option<String>,
}

/// Remove the `?usp=drivesdk` marker from a Drive link.
#[must_use]
pub fn strip_sdk_suffix(link: &str) -> String {
    link.replace(SDK_SUFFIX, "")
}

impl GoogleDriveStore {
    pub fn new(options: GoogleDriveOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::external("failed to build drive http client", e))?;
        Ok(Self {
            http,
            credentials: options.credentials,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            upload_url: options.upload_url.trim_end_matches('/').to_string(),
            token_cache: tokio::sync::Mutex::new(None),
        })
    }

    async fn token(&self) -> Result<Secret<String>> {
        get_access_token(&self.http, &self.credentials, &self.token_cache).await
    }

    async fn check(operation: &'static str, resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api {
            operation,
            status,
            body,
        })
    }

    /// Open a resumable upload session and return its URL.
    async fn start_session(&self, token: &str, file: &NewFile, length: usize) -> Result<String> {
        let url = format!("{}/files", self.upload_url);
        let metadata = json!({
            "name": file.title,
            "mimeType": file.content_type,
            "parents": [file.parent_folder],
        });
        let resp = self
            .http
            .post(url)
            .query(&[
                ("uploadType", "resumable"),
                ("supportsAllDrives", "true"),
                ("fields", "id,webViewLink"),
            ])
            .bearer_auth(token)
            .header("X-Upload-Content-Type", file.content_type.as_str())
            .header("X-Upload-Content-Length", length.to_string())
            .json(&metadata)
            .send()
            .await
            .map_err(|e| Error::external("drive upload session request failed", e))?;
        let resp = Self::check("upload session", resp).await?;

        resp.headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .context("drive upload session response has no Location header")
    }
}

#[async_trait]
impl CloudFileStore for GoogleDriveStore {
    async fn upload(&self, file: &NewFile, path: &Path) -> Result<StoredFile> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let token = self.token().await?;

        let session = self
            .start_session(token.expose_secret(), file, bytes.len())
            .await?;
        debug!(title = %file.title, size = bytes.len(), "drive upload session opened");

        let resp = self
            .http
            .put(session)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, file.content_type.as_str())
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::external("drive upload failed", e))?;
        let resp = Self::check("upload", resp).await?;
        let resource = resp
            .json::<FileResource>()
            .await
            .context("invalid drive upload response")?;

        let link = resource
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", resource.id));
        let link = strip_sdk_suffix(&link);
        info!(id = %resource.id, link = %link, "uploaded to drive");
        Ok(StoredFile {
            id: resource.id,
            link,
        })
    }

    async fn set_public(&self, id: &str) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/files/{}/permissions", self.api_url, urlencoding::encode(id));
        let resp = self
            .http
            .post(url)
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token.expose_secret())
            .json(&json!({ "type": "anyone", "role": "reader" }))
            .send()
            .await
            .map_err(|e| Error::external("drive permission request failed", e))?;
        Self::check("permission insert", resp).await?;
        debug!(id, "drive file shared with anyone holding the link");
        Ok(())
    }
}
