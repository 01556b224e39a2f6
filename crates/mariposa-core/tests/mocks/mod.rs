//! Scripted backend and recording view for controller tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use mariposa_core::{
    AppError, AppResult, Backend, DownloadMode, MediaInfo, ProgressEvent, ProgressStatus,
    ProgressStream, QualityChoice, Step, WizardView,
};

/// Call counters and arguments captured by the mock backend.
#[derive(Debug, Default)]
pub struct Calls {
    pub fetch_info: usize,
    pub start_download: usize,
    pub open_progress: usize,
    pub fetch_file: usize,
    /// (url, mode, quality) of the last start_download call.
    pub last_start: Option<(String, String, Option<String>)>,
}

#[derive(Default)]
struct Inner {
    calls: Mutex<Calls>,
    info_results: Mutex<VecDeque<AppResult<MediaInfo>>>,
    start_results: Mutex<VecDeque<AppResult<String>>>,
    /// Each entry scripts one progress subscription; the connection yields
    /// its events and then ends.
    connections: Mutex<VecDeque<Vec<AppResult<ProgressEvent>>>>,
    file_results: Mutex<VecDeque<AppResult<PathBuf>>>,
}

/// Backend whose responses are scripted up front. Clone it to keep a handle
/// for inspecting calls after the controller consumed it.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Inner>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_info(&self, result: AppResult<MediaInfo>) -> &Self {
        self.inner.info_results.lock().unwrap().push_back(result);
        self
    }

    pub fn push_start(&self, result: AppResult<String>) -> &Self {
        self.inner.start_results.lock().unwrap().push_back(result);
        self
    }

    pub fn push_connection(&self, events: Vec<AppResult<ProgressEvent>>) -> &Self {
        self.inner.connections.lock().unwrap().push_back(events);
        self
    }

    pub fn push_file(&self, result: AppResult<PathBuf>) -> &Self {
        self.inner.file_results.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.inner.calls.lock().unwrap()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn fetch_info(&self, _url: &str) -> AppResult<MediaInfo> {
        self.inner.calls.lock().unwrap().fetch_info += 1;
        self.inner
            .info_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Backend("no info scripted".to_string())))
    }

    async fn start_download(
        &self,
        url: &str,
        mode: DownloadMode,
        quality: Option<&str>,
    ) -> AppResult<String> {
        let mut calls = self.inner.calls.lock().unwrap();
        calls.start_download += 1;
        calls.last_start =
            Some((url.to_string(), mode.as_str().to_string(), quality.map(str::to_string)));
        drop(calls);
        self.inner
            .start_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("dl-1".to_string()))
    }

    async fn open_progress(&self, _download_id: &str) -> AppResult<ProgressStream> {
        self.inner.calls.lock().unwrap().open_progress += 1;
        match self.inner.connections.lock().unwrap().pop_front() {
            Some(events) => Ok(Box::pin(stream::iter(events))),
            None => Err(AppError::Backend("no connection scripted".to_string())),
        }
    }

    async fn fetch_file(&self, _download_id: &str, dest_dir: &Path) -> AppResult<PathBuf> {
        self.inner.calls.lock().unwrap().fetch_file += 1;
        self.inner
            .file_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(dest_dir.join("download.mp3")))
    }
}

/// Everything a view can observe, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Step(Step),
    Loading(bool),
    MediaInfo(String, Vec<String>),
    PlaylistInfo(String, u64),
    Notice(String),
    Progress(ProgressStatus, u64),
    Completed(PathBuf),
    Failed(String),
}

/// View that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub seen: Vec<Seen>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress_count(&self) -> usize {
        self.seen.iter().filter(|s| matches!(s, Seen::Progress(..))).count()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Failed(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl WizardView for RecordingView {
    fn step_changed(&mut self, step: Step) {
        self.seen.push(Seen::Step(step));
    }

    fn loading(&mut self, on: bool) {
        self.seen.push(Seen::Loading(on));
    }

    fn media_info(&mut self, info: &MediaInfo, options: &[QualityChoice]) {
        self.seen.push(Seen::MediaInfo(
            info.title.clone(),
            options.iter().map(|o| o.label.clone()).collect(),
        ));
    }

    fn playlist_info(&mut self, title: &str, count: u64) {
        self.seen.push(Seen::PlaylistInfo(title.to_string(), count));
    }

    fn notice(&mut self, message: &str) {
        self.seen.push(Seen::Notice(message.to_string()));
    }

    fn progress(&mut self, event: &ProgressEvent) {
        self.seen.push(Seen::Progress(event.status, event.percent.round() as u64));
    }

    fn completed(&mut self, saved_to: &Path) {
        self.seen.push(Seen::Completed(saved_to.to_path_buf()));
    }

    fn failed(&mut self, message: &str) {
        self.seen.push(Seen::Failed(message.to_string()));
    }
}

/// A single-media info payload with video and audio qualities.
pub fn single_info() -> MediaInfo {
    serde_json::from_str(
        r#"{
            "title": "Test Video",
            "channel": "Test Channel",
            "thumbnail": "https://i/t.jpg",
            "duration": 213,
            "is_playlist": false,
            "video_qualities": [
                {"label": "1080p", "height": 1080},
                {"label": "720p", "height": 720}
            ],
            "audio_qualities": [
                {"label": "320 kbps", "abr": 320},
                {"label": "160 kbps", "abr": 160}
            ]
        }"#,
    )
    .unwrap()
}

/// A playlist info payload.
pub fn playlist_info() -> MediaInfo {
    serde_json::from_str(r#"{"title": "Road Trip Mix", "is_playlist": true, "count": 17}"#).unwrap()
}

/// Shorthand for a progress event without a message.
pub fn ev(status: ProgressStatus, percent: f64) -> AppResult<ProgressEvent> {
    Ok(ProgressEvent { status, percent, speed: None, message: None })
}

/// Shorthand for a progress event with a message.
pub fn ev_msg(status: ProgressStatus, percent: f64, message: &str) -> AppResult<ProgressEvent> {
    Ok(ProgressEvent { status, percent, speed: None, message: Some(message.to_string()) })
}
