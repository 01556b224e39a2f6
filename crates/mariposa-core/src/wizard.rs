//! The pure wizard state machine, independent of any rendering layer and of
//! the network. The controller drives it; tests exercise it directly.

use crate::session::{Mode, Platform, SessionState};

/// Wizard steps. `Mode` only appears for the music platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Platform,
    Mode,
    UrlEntry,
    Progress,
    Complete,
    Error,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Mode => "mode",
            Self::UrlEntry => "url_entry",
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

/// Step-transition machine owning the session state.
///
/// Transitions:
/// - `Platform → UrlEntry` for youtube/instagram, `Platform → Mode` for music
/// - `Mode → UrlEntry` always
/// - `UrlEntry → Progress` on download initiation
/// - `Progress → Complete | Error` on the terminal progress signal
/// - any step `→ Platform` on reset, clearing all state
#[derive(Debug, Clone, Default)]
pub struct Flow {
    step: Step,
    state: SessionState,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// First step: choose a platform. Music inserts the mode step, the
    /// other platforms go straight to URL entry.
    pub fn select_platform(&mut self, platform: Platform) -> Step {
        self.state.platform = Some(platform);
        if platform.has_mode_step() {
            self.state.mode = None;
            self.step = Step::Mode;
        } else {
            self.enter_url_entry();
        }
        self.step
    }

    /// Mode step (music only): single track or playlist.
    pub fn select_mode(&mut self, mode: Mode) -> Step {
        self.state.mode = Some(mode);
        self.enter_url_entry()
    }

    /// Back from URL entry to the mode step, dropping the mode choice.
    pub fn back_to_mode(&mut self) -> Step {
        self.state.mode = None;
        self.step = Step::Mode;
        self.step
    }

    /// Enter (or re-enter) URL entry. Re-entry clears the previous url,
    /// metadata, and quality selection.
    pub fn enter_url_entry(&mut self) -> Step {
        self.state.clear_url_entry();
        self.step = Step::UrlEntry;
        self.step
    }

    /// A download attempt has been initiated.
    pub fn begin_download(&mut self) -> Step {
        self.step = Step::Progress;
        self.step
    }

    /// Terminal: the download finished and the file was retrieved.
    pub fn finish(&mut self) -> Step {
        self.step = Step::Complete;
        self.step
    }

    /// Terminal: the attempt failed.
    pub fn fail(&mut self) -> Step {
        self.step = Step::Error;
        self.step
    }

    /// Explicit reset from any step: back to platform selection with a
    /// blank session.
    pub fn reset(&mut self) -> Step {
        self.state.reset();
        self.step = Step::Platform;
        self.step
    }
}
