use crate::api::MediaInfo;

/// Sentinel quality value meaning "best available".
pub const BEST: &str = "best";

/// Source platform chosen on the first wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
    Instagram,
    Music,
}

impl Platform {
    /// Parse from stored string value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "youtube" => Some(Self::Youtube),
            "instagram" => Some(Self::Instagram),
            "music" => Some(Self::Music),
            _ => None,
        }
    }

    /// Serialize to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Instagram => "instagram",
            Self::Music => "music",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Youtube => "YouTube",
            Self::Instagram => "Instagram",
            Self::Music => "Music",
        }
    }

    /// Guess the platform from a source URL's host. Instagram hosts map to
    /// Instagram, everything else (including plain audio sources) defaults
    /// to YouTube video handling.
    pub fn from_url(url: &url::Url) -> Self {
        match url.host_str().map(|h| h.to_lowercase()).as_deref() {
            Some(h) if h.contains("instagram") => Self::Instagram,
            Some(h) if h.contains("soundcloud") || h.contains("bandcamp") => Self::Music,
            _ => Self::Youtube,
        }
    }

    /// Whether this platform needs the single/playlist mode step.
    pub fn has_mode_step(&self) -> bool {
        matches!(self, Self::Music)
    }
}

/// Single track vs. whole playlist, asked only for the music platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Playlist,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Playlist => "playlist",
        }
    }
}

/// Kind of a quality option: a video resolution or an audio bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityKind {
    Video,
    Audio,
}

/// A selected quality: kind plus either a concrete value ("1080", "320")
/// or the `best` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quality {
    pub kind: QualityKind,
    pub value: String,
}

impl Quality {
    pub fn video(value: impl Into<String>) -> Self {
        Self { kind: QualityKind::Video, value: value.into() }
    }

    pub fn audio(value: impl Into<String>) -> Self {
        Self { kind: QualityKind::Audio, value: value.into() }
    }

    pub fn is_best(&self) -> bool {
        self.value == BEST
    }
}

/// Download mode token sent to the service's download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    VideoBest,
    VideoQuality,
    AudioBest,
    AudioQuality,
    Playlist,
}

impl DownloadMode {
    /// Derive the mode token from a selected quality: video or audio,
    /// crossed with a specific value or the best sentinel.
    pub fn for_quality(quality: &Quality) -> Self {
        match (quality.kind, quality.is_best()) {
            (QualityKind::Video, true) => Self::VideoBest,
            (QualityKind::Video, false) => Self::VideoQuality,
            (QualityKind::Audio, true) => Self::AudioBest,
            (QualityKind::Audio, false) => Self::AudioQuality,
        }
    }

    /// Wire value, matching the service contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VideoBest => "video_best",
            Self::VideoQuality => "video_quality",
            Self::AudioBest => "audio_best",
            Self::AudioQuality => "audio_quality",
            Self::Playlist => "playlist",
        }
    }

    /// Parse from the wire value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video_best" => Some(Self::VideoBest),
            "video_quality" => Some(Self::VideoQuality),
            "audio_best" => Some(Self::AudioBest),
            "audio_quality" => Some(Self::AudioQuality),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }

    /// Single-media modes must carry a quality value; playlist must not.
    pub fn requires_quality(&self) -> bool {
        !matches!(self, Self::Playlist)
    }
}

/// One entry of the quality picker shown after a metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityChoice {
    pub label: String,
    pub quality: Quality,
}

impl QualityChoice {
    fn new(label: impl Into<String>, quality: Quality) -> Self {
        Self { label: label.into(), quality }
    }
}

/// Build the quality picker for a fetched single media item.
///
/// YouTube gets the reported video resolutions plus a best-audio MP3 option;
/// Instagram gets fixed best-video/best-audio options (the service does not
/// report per-format qualities for it); music gets the reported audio
/// bitrates.
pub fn quality_options(platform: Platform, info: &MediaInfo) -> Vec<QualityChoice> {
    match platform {
        Platform::Youtube => {
            let mut options: Vec<QualityChoice> = info
                .video_qualities
                .iter()
                .map(|q| QualityChoice::new(q.label.clone(), Quality::video(q.height.to_string())))
                .collect();
            options.push(QualityChoice::new("Best Audio (MP3)", Quality::audio(BEST)));
            options
        }
        Platform::Instagram => vec![
            QualityChoice::new("Best Quality Video", Quality::video(BEST)),
            QualityChoice::new("Audio Only (MP3)", Quality::audio(BEST)),
        ],
        Platform::Music => info
            .audio_qualities
            .iter()
            .map(|q| QualityChoice::new(q.label.clone(), Quality::audio(q.abr.to_string())))
            .collect(),
    }
}

/// In-memory state of one wizard pass, owned by the controller instance.
/// Lost when the controller is dropped; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub platform: Option<Platform>,
    pub mode: Option<Mode>,
    pub url: String,
    /// Last fetched metadata; `selected_quality` is only meaningful while
    /// this is present.
    pub media_info: Option<MediaInfo>,
    pub selected_quality: Option<Quality>,
    /// Identifier assigned by the service for an in-flight download; only
    /// meaningful while a download/progress subscription is active.
    pub download_id: Option<String>,
    /// Busy guard: set while a download attempt is in flight, cleared on
    /// completion, error, or failed initiation.
    pub is_downloading: bool,
}

impl SessionState {
    /// Clear the URL-entry fields, keeping platform and mode. Applied when
    /// (re-)entering the URL entry step.
    pub fn clear_url_entry(&mut self) {
        self.url.clear();
        self.media_info = None;
        self.selected_quality = None;
    }

    /// Full reset back to a blank session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
