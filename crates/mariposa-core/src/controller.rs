//! The wizard controller: owns the session state and the step machine,
//! issues the network operations, and reports UI-relevant changes through
//! the [`WizardView`] seam so the transition logic stays testable without a
//! terminal or a real network.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;

use crate::api::types::{MediaInfo, ProgressEvent, ProgressStatus};
use crate::api::Backend;
use crate::config;
use crate::error::{AppError, AppResult};
use crate::session::{quality_options, DownloadMode, Mode, Platform, QualityChoice};
use crate::wizard::{Flow, Step};

/// Rendering seam. The controller pushes every UI-relevant change through
/// this trait; implementations draw a console, a TUI, or (in tests) just
/// record what happened. All methods default to no-ops so views implement
/// only what they render.
pub trait WizardView {
    /// The wizard moved to a different step.
    fn step_changed(&mut self, _step: Step) {}

    /// The metadata fetch started or finished (loading indicator).
    fn loading(&mut self, _on: bool) {}

    /// Metadata for a single media item arrived, with its quality picker.
    /// The first option is pre-selected.
    fn media_info(&mut self, _info: &MediaInfo, _options: &[QualityChoice]) {}

    /// Metadata for a playlist arrived.
    fn playlist_info(&mut self, _title: &str, _count: u64) {}

    /// A non-fatal problem: the wizard stays on the current step.
    fn notice(&mut self, _message: &str) {}

    /// A progress event arrived on the subscription.
    fn progress(&mut self, _event: &ProgressEvent) {}

    /// The download finished and the file was saved.
    fn completed(&mut self, _saved_to: &Path) {}

    /// The attempt failed; the wizard is on the error step.
    fn failed(&mut self, _message: &str) {}
}

/// View that renders nothing. Handy for headless use of the controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl WizardView for NullView {}

/// The wizard controller.
///
/// Generic over the backend (real HTTP client or a test mock) and the view.
/// One instance drives one browser-tab-equivalent session; dropping it
/// drops all state.
pub struct Wizard<B, V> {
    backend: B,
    view: V,
    flow: Flow,
    options: Vec<QualityChoice>,
    selected: Option<usize>,
    download_dir: PathBuf,
}

impl<B: Backend, V: WizardView> Wizard<B, V> {
    pub fn new(backend: B, view: V) -> Self {
        Self {
            backend,
            view,
            flow: Flow::new(),
            options: Vec::new(),
            selected: None,
            download_dir: config::download_dir(),
        }
    }

    /// Override where retrieved files are saved (defaults to the configured
    /// download folder).
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn step(&self) -> Step {
        self.flow.step()
    }

    pub fn state(&self) -> &crate::session::SessionState {
        self.flow.state()
    }

    /// Current quality picker (empty until a single-media fetch succeeds).
    pub fn options(&self) -> &[QualityChoice] {
        &self.options
    }

    /// Index of the currently selected quality option, if any.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    // ---- step transitions ----

    pub fn select_platform(&mut self, platform: Platform) {
        let step = self.flow.select_platform(platform);
        log::debug!("Platform {} -> step {}", platform.as_str(), step.as_str());
        self.clear_options();
        self.view.step_changed(step);
    }

    pub fn select_mode(&mut self, mode: Mode) {
        let step = self.flow.select_mode(mode);
        self.view.step_changed(step);
    }

    /// Back from URL entry to the mode step (music only).
    pub fn back_to_mode(&mut self) {
        let step = self.flow.back_to_mode();
        self.clear_options();
        self.view.step_changed(step);
    }

    /// Explicit reset: back to the first step with a blank session.
    pub fn reset(&mut self) {
        let step = self.flow.reset();
        self.clear_options();
        self.view.step_changed(step);
    }

    fn clear_options(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    // ---- operations ----

    /// Fetch metadata for a source URL. An empty URL is rejected before any
    /// request is made. On success the session holds the metadata and, for
    /// single media, the quality picker with the first option selected; on
    /// failure the wizard stays on URL entry with the message surfaced
    /// through the view.
    pub async fn fetch_metadata(&mut self, url: &str) -> AppResult<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::Validation("no URL provided".to_string()));
        }
        if url.len() > config::validation::MAX_URL_LENGTH {
            return Err(AppError::Validation("URL is too long".to_string()));
        }
        if self.flow.state().is_downloading {
            return Err(AppError::Validation("a download is already in progress".to_string()));
        }

        self.flow.state_mut().url = url.to_string();
        self.clear_options();
        self.view.loading(true);
        let result = self.backend.fetch_info(url).await;
        self.view.loading(false);

        let info = match result {
            Ok(info) => info,
            Err(e) => {
                self.view.notice(&e.to_string());
                return Err(e);
            }
        };

        if info.is_playlist {
            self.view.playlist_info(&info.title, info.count.unwrap_or(0));
        } else {
            let platform = self.flow.state().platform.unwrap_or(Platform::Youtube);
            self.options = quality_options(platform, &info);
            if self.options.is_empty() {
                let msg = "No downloadable formats reported for this URL";
                self.view.notice(msg);
                return Err(AppError::Backend(msg.to_string()));
            }
            // Pre-select the first option, like the picker opens with.
            self.selected = Some(0);
            self.flow.state_mut().selected_quality = Some(self.options[0].quality.clone());
            self.view.media_info(&info, &self.options);
        }
        self.flow.state_mut().media_info = Some(info);
        Ok(())
    }

    /// Select one quality option by picker index. Pure state update; the
    /// last selection wins and exactly one option is selected at a time.
    pub fn select_quality(&mut self, index: usize) -> AppResult<()> {
        let choice = self
            .options
            .get(index)
            .ok_or_else(|| AppError::Validation(format!("no quality option #{}", index)))?;
        self.selected = Some(index);
        self.flow.state_mut().selected_quality = Some(choice.quality.clone());
        Ok(())
    }

    /// Start a single-media download with the selected quality, deriving
    /// the wire mode token from it.
    pub async fn start_download(&mut self) -> AppResult<()> {
        let quality = self
            .flow
            .state()
            .selected_quality
            .clone()
            .ok_or_else(|| AppError::Validation("no quality selected".to_string()))?;
        let mode = DownloadMode::for_quality(&quality);
        self.initiate_download(mode, Some(quality.value)).await
    }

    /// Start a playlist download. Always mode `playlist`, never a quality,
    /// regardless of any previous single-media selection.
    pub async fn start_playlist_download(&mut self) -> AppResult<()> {
        self.initiate_download(DownloadMode::Playlist, None).await
    }

    /// Initiate a download and, on success, follow its progress stream to a
    /// terminal state.
    pub async fn initiate_download(
        &mut self,
        mode: DownloadMode,
        quality: Option<String>,
    ) -> AppResult<()> {
        if mode.requires_quality() && quality.is_none() {
            return Err(AppError::Validation(format!(
                "mode {} requires a quality value",
                mode.as_str()
            )));
        }
        if self.flow.state().is_downloading {
            return Err(AppError::Validation("a download is already in progress".to_string()));
        }

        self.flow.state_mut().is_downloading = true;
        let step = self.flow.begin_download();
        self.view.step_changed(step);

        let url = self.flow.state().url.clone();
        match self.backend.start_download(&url, mode, quality.as_deref()).await {
            Ok(id) => {
                self.flow.state_mut().download_id = Some(id.clone());
                self.track_progress(&id).await
            }
            Err(e) => {
                self.flow.state_mut().is_downloading = false;
                self.flow.fail();
                self.view.step_changed(Step::Error);
                self.view.failed(&e.to_string());
                Err(e)
            }
        }
    }

    /// Consume the progress subscription for `download_id` until a terminal
    /// status. A `complete` status triggers exactly one file retrieval and
    /// moves to the complete step; an `error` status surfaces the service's
    /// message verbatim on the error step.
    ///
    /// A transport-level drop (stream error or end without a terminal
    /// status) is retried with a bounded budget; exhausting it is a hard
    /// failure rather than a silent hang.
    pub async fn track_progress(&mut self, download_id: &str) -> AppResult<()> {
        let mut reconnects: u32 = 0;
        loop {
            let mut events = match self.backend.open_progress(download_id).await {
                Ok(stream) => stream,
                Err(e) => {
                    log::warn!("Progress subscription failed to open: {}", e);
                    if !self.wait_for_reconnect(&mut reconnects).await {
                        return self.fail_stream_lost(reconnects);
                    }
                    continue;
                }
            };

            loop {
                match events.next().await {
                    Some(Ok(event)) => {
                        self.view.progress(&event);
                        match event.status {
                            ProgressStatus::Complete => {
                                drop(events);
                                return self.retrieve_file(download_id).await;
                            }
                            ProgressStatus::Error => {
                                let message = event
                                    .message
                                    .unwrap_or_else(|| "Download failed".to_string());
                                self.flow.state_mut().is_downloading = false;
                                self.flow.fail();
                                self.view.step_changed(Step::Error);
                                self.view.failed(&message);
                                return Err(AppError::Backend(message));
                            }
                            _ => {}
                        }
                    }
                    Some(Err(e)) => {
                        log::warn!("Progress stream error: {}", e);
                        break;
                    }
                    // Stream ended without a terminal status.
                    None => {
                        log::warn!("Progress stream closed before a terminal status");
                        break;
                    }
                }
            }

            if !self.wait_for_reconnect(&mut reconnects).await {
                return self.fail_stream_lost(reconnects);
            }
        }
    }

    /// Burn one reconnect attempt, sleeping the configured delay. Returns
    /// false once the budget is exhausted.
    async fn wait_for_reconnect(&self, reconnects: &mut u32) -> bool {
        if *reconnects >= config::retry::MAX_STREAM_RECONNECTS {
            return false;
        }
        *reconnects += 1;
        log::info!(
            "Reconnecting to progress stream (attempt {}/{})",
            reconnects,
            config::retry::MAX_STREAM_RECONNECTS
        );
        tokio::time::sleep(config::retry::reconnect_delay()).await;
        true
    }

    fn fail_stream_lost(&mut self, attempts: u32) -> AppResult<()> {
        let err = AppError::StreamLost { attempts };
        self.flow.state_mut().is_downloading = false;
        self.flow.fail();
        self.view.step_changed(Step::Error);
        self.view.failed(&err.to_string());
        Err(err)
    }

    #[cfg(test)]
    fn flow_mut(&mut self) -> &mut Flow {
        &mut self.flow
    }

    async fn retrieve_file(&mut self, download_id: &str) -> AppResult<()> {
        let dest = self.download_dir.clone();
        match self.backend.fetch_file(download_id, &dest).await {
            Ok(path) => {
                self.flow.state_mut().is_downloading = false;
                self.flow.finish();
                self.view.step_changed(Step::Complete);
                self.view.completed(&path);
                Ok(())
            }
            Err(e) => {
                self.flow.state_mut().is_downloading = false;
                self.flow.fail();
                self.view.step_changed(Step::Error);
                self.view.failed(&e.to_string());
                Err(e)
            }
        }
    }
}
