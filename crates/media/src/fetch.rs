//! Download an attachment into a temporary file.

use std::{io::Write, path::Path, time::Duration};

use {
    reqwest::redirect::Policy,
    tempfile::NamedTempFile,
    tracing::{debug, error, warn},
};

use crate::{Error, Result, image_ops::read_dimensions, mime::extension_for};

/// HTTP limits applied to every attachment download.
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Largest accepted body. `0` disables the check.
    pub max_bytes: u64,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            max_redirects: 10,
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

/// A fetched attachment staged on local disk.
///
/// The backing file is removed when the artifact is dropped.
#[derive(Debug)]
pub struct Artifact {
    file: NamedTempFile,
    /// URL the body was finally served from, after redirects.
    pub final_url: String,
    pub content_type: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
}

impl Artifact {
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged body back into memory.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(self.path())
            .map_err(|e| Error::external(format!("failed to read {}", self.path().display()), e))
    }
}

/// Fetches attachments over HTTP.
#[derive(Debug, Clone)]
pub struct MediaRetriever {
    client: reqwest::Client,
    max_bytes: u64,
}

impl MediaRetriever {
    pub fn new(options: RetrieverOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .redirect(Policy::limited(options.max_redirects))
            .build()
            .map_err(|e| Error::external("failed to build media http client", e))?;
        Ok(Self {
            client,
            max_bytes: options.max_bytes,
        })
    }

    /// GET `url`, stage the body and read its dimensions.
    ///
    /// Transport errors and non-success statuses are returned as errors. An
    /// undecodable body still yields an artifact, with zero dimensions.
    pub async fn fetch(&self, url: &str, content_type: &str) -> Result<Artifact> {
        let result = self.fetch_inner(url, content_type).await;

        #[cfg(feature = "metrics")]
        match &result {
            Ok(artifact) => {
                phoso_metrics::counter!(phoso_metrics::media::FETCHED_TOTAL).increment(1);
                phoso_metrics::counter!(phoso_metrics::media::FETCHED_BYTES_TOTAL)
                    .increment(artifact.size);
            },
            Err(_) => {
                phoso_metrics::counter!(phoso_metrics::media::FETCH_FAILURES_TOTAL).increment(1);
            },
        }

        result
    }

    async fn fetch_inner(&self, url: &str, content_type: &str) -> Result<Artifact> {
        if url.trim().is_empty() {
            return Err(Error::invalid_input("attachment url is empty"));
        }

        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::external(format!("failed to fetch {url}"), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let final_url = resp.url().to_string();

        if self.max_bytes > 0
            && let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(Error::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut file = tempfile::Builder::new()
            .prefix("phoso-")
            .suffix(extension_for(content_type).unwrap_or_default())
            .tempfile()
            .map_err(|e| Error::external("failed to create temp file", e))?;

        let mut size: u64 = 0;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Error::external(format!("failed to read body of {url}"), e))?
        {
            size += chunk.len() as u64;
            if self.max_bytes > 0 && size > self.max_bytes {
                return Err(Error::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk)
                .map_err(|e| Error::external("failed to write temp file", e))?;
        }
        file.flush()
            .map_err(|e| Error::external("failed to flush temp file", e))?;

        if final_url != url {
            debug!(url, final_url = %final_url, "attachment redirected");
        }
        if size == 0 {
            warn!(url, "attachment body is empty");
        }

        let staged = file.path().to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || read_dimensions(&staged))
            .await
            .unwrap_or_else(|e| {
                error!(url, error = %e, "dimension reader did not finish");
                (0, 0)
            });
        debug!(url, size, width, height, path = %file.path().display(), "attachment staged");

        Ok(Artifact {
            file,
            final_url,
            content_type: content_type.to_string(),
            size,
            width,
            height,
        })
    }
}
