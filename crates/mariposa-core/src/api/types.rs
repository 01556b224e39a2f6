use serde::{Deserialize, Serialize};

/// A video quality option reported by the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoQuality {
    pub label: String,
    pub height: u32,
}

/// An audio quality option reported by the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioQuality {
    pub label: String,
    pub abr: u32,
}

/// Metadata for a single media item or a playlist, as returned by
/// `POST /api/info`. Which fields are populated varies by platform and by
/// single vs. playlist, so everything except the title is optional or
/// defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Duration in seconds (absent for playlists).
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub is_playlist: bool,
    #[serde(default)]
    pub video_qualities: Vec<VideoQuality>,
    #[serde(default)]
    pub audio_qualities: Vec<AudioQuality>,
    /// Number of entries (playlists only).
    #[serde(default)]
    pub count: Option<u64>,
}

impl MediaInfo {
    /// Duration formatted as `m:ss`, if known.
    pub fn duration_display(&self) -> Option<String> {
        self.duration.map(|secs| format!("{}:{:02}", secs / 60, secs % 60))
    }
}

/// Phase of an in-flight download, as pushed on the progress stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// The service accepted the job and is preparing it.
    Starting,
    /// The job is known but has not reported anything yet.
    Waiting,
    /// Transfer in progress; `percent` and possibly `speed` are meaningful.
    Downloading,
    /// Post-processing (conversion, packaging).
    Processing,
    /// Terminal: the file is ready for retrieval.
    Complete,
    /// Terminal: the job failed; `message` carries the reason.
    Error,
}

impl ProgressStatus {
    /// Terminal statuses end the subscription.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// One event from `GET /api/progress/{download_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    #[serde(default)]
    pub percent: f64,
    /// Transfer rate in bytes per second, reported while downloading.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/info`.
#[derive(Debug, Serialize)]
pub(crate) struct InfoRequest<'a> {
    pub url: &'a str,
}

/// Body of `POST /api/download`.
#[derive(Debug, Serialize)]
pub(crate) struct DownloadRequest<'a> {
    pub url: &'a str,
    pub mode: &'a str,
    pub quality: Option<&'a str>,
}

/// Successful response of `POST /api/download`.
#[derive(Debug, Deserialize)]
pub(crate) struct DownloadStarted {
    pub download_id: String,
}

/// Error envelope the service uses on any endpoint: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_media_info_decodes() {
        let info: MediaInfo = serde_json::from_str(
            r#"{
                "title": "Some Video",
                "thumbnail": "https://i/img.jpg",
                "duration": 125,
                "channel": "Chan",
                "is_playlist": false,
                "video_qualities": [{"label": "1080p", "height": 1080}],
                "audio_qualities": [{"label": "160 kbps", "abr": 160}]
            }"#,
        )
        .unwrap();
        assert!(!info.is_playlist);
        assert_eq!(info.duration_display().as_deref(), Some("2:05"));
        assert_eq!(info.video_qualities[0].height, 1080);
    }

    #[test]
    fn test_playlist_info_decodes_without_quality_fields() {
        let info: MediaInfo = serde_json::from_str(
            r#"{"title": "Mix", "is_playlist": true, "count": 42, "thumbnail": ""}"#,
        )
        .unwrap();
        assert!(info.is_playlist);
        assert_eq!(info.count, Some(42));
        assert!(info.video_qualities.is_empty());
    }

    #[test]
    fn test_progress_event_statuses() {
        let ev: ProgressEvent =
            serde_json::from_str(r#"{"status": "downloading", "percent": 41.5, "speed": 1048576.0}"#)
                .unwrap();
        assert_eq!(ev.status, ProgressStatus::Downloading);
        assert!(!ev.status.is_terminal());
        assert_eq!(ev.speed, Some(1_048_576.0));

        // Extra fields from the service (eta, filepath) are ignored.
        let ev: ProgressEvent = serde_json::from_str(
            r#"{"status": "complete", "percent": 100, "message": "Download complete!", "filepath": "/tmp/x"}"#,
        )
        .unwrap();
        assert!(ev.status.is_terminal());

        let ev: ProgressEvent = serde_json::from_str(r#"{"status": "waiting", "percent": 0}"#).unwrap();
        assert_eq!(ev.status, ProgressStatus::Waiting);
    }
}
