//! The reqwest-backed API client, and the `Backend` trait it implements.
//!
//! The trait is the seam the controller is generic over: the real client
//! talks HTTP+SSE, tests substitute channel-backed mocks.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncWriteExt;

use crate::api::sse::SseParser;
use crate::api::types::{
    DownloadRequest, DownloadStarted, ErrorBody, InfoRequest, MediaInfo, ProgressEvent,
};
use crate::config;
use crate::error::{AppError, AppResult};
use crate::session::DownloadMode;

/// The progress subscription as an abstract inbound event stream.
pub type ProgressStream = Pin<Box<dyn futures_util::Stream<Item = AppResult<ProgressEvent>> + Send>>;

/// Operations the wizard controller needs from the service.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/info` — resolve metadata for a source URL.
    async fn fetch_info(&self, url: &str) -> AppResult<MediaInfo>;

    /// `POST /api/download` — start a download, returning its identifier.
    async fn start_download(
        &self,
        url: &str,
        mode: DownloadMode,
        quality: Option<&str>,
    ) -> AppResult<String>;

    /// `GET /api/progress/{id}` — open the progress subscription.
    async fn open_progress(&self, download_id: &str) -> AppResult<ProgressStream>;

    /// `GET /api/download_file/{id}` — retrieve the finished file into
    /// `dest_dir`, returning the saved path. The local filename comes from
    /// the `Content-Disposition` response header.
    async fn fetch_file(&self, download_id: &str, dest_dir: &Path) -> AppResult<PathBuf>;
}

/// HTTP client for the media-download service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Create a client against the given base URL (e.g.
    /// `http://127.0.0.1:5000`).
    pub fn new(base_url: &str) -> AppResult<Self> {
        // Validate early so a bad MARIPOSA_SERVER fails at startup, not on
        // the first request.
        url::Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(config::network::connect_timeout())
            .build()?;
        Ok(Self { http, base: base_url.trim_end_matches('/').to_string() })
    }

    /// Client against the configured default server.
    pub fn from_env() -> AppResult<Self> {
        Self::new(&config::SERVER_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// Decode a JSON response, mapping the service's `{"error": ...}`
    /// envelope to `AppError::Backend` with the message verbatim.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if let Ok(body) = serde_json::from_slice::<ErrorBody>(&bytes) {
            return Err(AppError::Backend(body.error));
        }
        if !status.is_success() {
            return Err(AppError::HttpStatus(status));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_info(&self, url: &str) -> AppResult<MediaInfo> {
        log::debug!("Fetching media info for {}", url);
        let resp = self
            .http
            .post(self.endpoint("api/info"))
            .timeout(config::network::timeout())
            .json(&InfoRequest { url })
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn start_download(
        &self,
        url: &str,
        mode: DownloadMode,
        quality: Option<&str>,
    ) -> AppResult<String> {
        log::info!("Starting download: mode={} quality={:?}", mode.as_str(), quality);
        let resp = self
            .http
            .post(self.endpoint("api/download"))
            .timeout(config::network::timeout())
            .json(&DownloadRequest { url, mode: mode.as_str(), quality })
            .send()
            .await?;
        let started: DownloadStarted = Self::decode(resp).await?;
        Ok(started.download_id)
    }

    async fn open_progress(&self, download_id: &str) -> AppResult<ProgressStream> {
        let resp = self
            .http
            .get(self.endpoint(&format!("api/progress/{}", download_id)))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus(status));
        }

        // Body chunks → SSE frames → decoded events. The queue holds frames
        // already completed by the last chunk but not yet yielded.
        let state = (resp.bytes_stream(), SseParser::new(), VecDeque::<String>::new());
        let events = stream::try_unfold(state, |(mut body, mut parser, mut pending)| async move {
            loop {
                if let Some(data) = pending.pop_front() {
                    let event: ProgressEvent = serde_json::from_str(&data)?;
                    return Ok(Some((event, (body, parser, pending))));
                }
                match body.next().await {
                    Some(Ok(chunk)) => pending.extend(parser.feed(&chunk)),
                    Some(Err(e)) => return Err(AppError::Http(e)),
                    None => return Ok(None),
                }
            }
        });
        Ok(Box::pin(events))
    }

    async fn fetch_file(&self, download_id: &str, dest_dir: &Path) -> AppResult<PathBuf> {
        let resp = self
            .http
            .get(self.endpoint(&format!("api/download_file/{}", download_id)))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus(status));
        }

        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| "download".to_string());

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(&filename);
        let mut file = tokio::fs::File::create(&path).await?;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        log::info!("Saved {} to {}", download_id, path.display());
        Ok(path)
    }
}

/// Extract a safe local filename from a `Content-Disposition` header.
///
/// Prefers the RFC 5987 `filename*=UTF-8''…` form (the service sends it for
/// non-ASCII titles), falling back to the plain `filename=` parameter. Any
/// path components are stripped.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain: Option<String> = None;
    let mut extended: Option<String> = None;

    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename*=") {
            let value = value.strip_prefix("UTF-8''").or_else(|| value.strip_prefix("utf-8''"));
            if let Some(encoded) = value {
                extended =
                    Some(urlencoding::decode(encoded).unwrap_or_else(|_| encoded.into()).to_string());
            }
        } else if let Some(value) = part.strip_prefix("filename=") {
            plain = Some(value.trim_matches('"').to_string());
        }
    }

    let name = extended.or(plain)?;
    // Keep only the final path component; a header must not pick the
    // destination directory.
    let name = name.rsplit(['/', '\\']).next().unwrap_or("").trim().to_string();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_filename() {
        assert_eq!(
            filename_from_disposition("attachment; filename=track.mp3"),
            Some("track.mp3".to_string())
        );
    }

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="My Song - 320kbps.mp3""#),
            Some("My Song - 320kbps.mp3".to_string())
        );
    }

    #[test]
    fn test_rfc5987_filename_preferred() {
        let header = "attachment; filename=fallback.mp3; filename*=UTF-8''na%C3%AFve%20song.mp3";
        assert_eq!(filename_from_disposition(header), Some("naïve song.mp3".to_string()));
    }

    #[test]
    fn test_path_components_stripped() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".to_string())
        );
        assert_eq!(filename_from_disposition(r#"attachment; filename="..""#), None);
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_malformed_escapes_pass_through() {
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''a%2xb.mp3"),
            Some("a%2xb.mp3".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''100%.mp3"),
            Some("100%.mp3".to_string())
        );
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("http://127.0.0.1:5000/").is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ApiClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(client.endpoint("api/info"), "http://127.0.0.1:5000/api/info");
    }
}
