//! Console rendering of wizard updates.

use std::io::{self, Write};
use std::path::Path;

use mariposa_core::{MediaInfo, ProgressEvent, ProgressStatus, QualityChoice, Step, WizardView};

const BAR_SEGMENTS: usize = 20;

/// View that renders wizard updates to stdout. Progress events redraw a
/// single line in place.
#[derive(Debug, Default)]
pub struct ConsoleView {
    // A progress line is currently open and needs a newline before any
    // other output.
    bar_open: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_bar(&mut self) {
        if self.bar_open {
            println!();
            self.bar_open = false;
        }
    }
}

impl WizardView for ConsoleView {
    fn step_changed(&mut self, step: Step) {
        log::debug!("Step: {}", step.as_str());
        if step == Step::Progress {
            println!();
        }
    }

    fn loading(&mut self, on: bool) {
        if on {
            println!("Fetching info...");
        }
    }

    fn media_info(&mut self, info: &MediaInfo, _options: &[QualityChoice]) {
        println!("\n  {}", info.title);
        if let Some(channel) = &info.channel {
            println!("  by {}", channel);
        }
        if let Some(duration) = info.duration_display() {
            println!("  duration {}", duration);
        }
    }

    fn playlist_info(&mut self, title: &str, count: u64) {
        println!("\n  Playlist: {} ({} tracks)", title, count);
    }

    fn notice(&mut self, message: &str) {
        self.end_bar();
        println!("⚠ {}", message);
    }

    fn progress(&mut self, event: &ProgressEvent) {
        let line = render_progress(event);
        if line.is_empty() {
            return;
        }
        // Pad to wipe leftovers of a longer previous line.
        print!("\r{:<60}", line);
        let _ = io::stdout().flush();
        self.bar_open = true;
    }

    fn completed(&mut self, saved_to: &Path) {
        self.end_bar();
        println!("\n✅ Download complete! Saved to {}", saved_to.display());
    }

    fn failed(&mut self, message: &str) {
        self.end_bar();
        println!("\n❌ {}", message);
    }
}

/// One line of progress text for the current event.
fn render_progress(event: &ProgressEvent) -> String {
    match event.status {
        ProgressStatus::Starting | ProgressStatus::Waiting => "Preparing download...".to_string(),
        ProgressStatus::Downloading => {
            let percent = event.percent.clamp(0.0, 100.0).round() as u8;
            let mut line = format!("{} {:>3}%", create_progress_bar(percent), percent);
            if let Some(speed) = event.speed {
                line.push_str(&format!("  {:.2} MB/s", speed / 1024.0 / 1024.0));
            }
            line
        }
        ProgressStatus::Processing => {
            format!("{} converting and processing...", create_progress_bar(100))
        }
        ProgressStatus::Complete => format!("{} 100%", create_progress_bar(100)),
        // The failed() callback renders the message.
        ProgressStatus::Error => String::new(),
    }
}

/// Text progress bar: [████████░░░░░░░░░░░░]
fn create_progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize * BAR_SEGMENTS) / 100;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_SEGMENTS - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(status: ProgressStatus, percent: f64, speed: Option<f64>) -> ProgressEvent {
        ProgressEvent { status, percent, speed, message: None }
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(create_progress_bar(0), format!("[{}]", "░".repeat(20)));
        assert_eq!(create_progress_bar(100), format!("[{}]", "█".repeat(20)));
        assert_eq!(create_progress_bar(50), format!("[{}{}]", "█".repeat(10), "░".repeat(10)));
        // Out-of-range input clamps instead of panicking.
        assert_eq!(create_progress_bar(255), create_progress_bar(100));
    }

    #[test]
    fn test_render_downloading_with_speed() {
        let line = event(ProgressStatus::Downloading, 41.4, Some(2.0 * 1024.0 * 1024.0));
        assert_eq!(render_progress(&line), format!("{} {:>3}%  2.00 MB/s", create_progress_bar(41), 41));
    }

    #[test]
    fn test_render_indeterminate_phases() {
        assert_eq!(
            render_progress(&event(ProgressStatus::Waiting, 0.0, None)),
            "Preparing download..."
        );
        assert!(render_progress(&event(ProgressStatus::Processing, 100.0, None))
            .contains("processing"));
        assert!(render_progress(&event(ProgressStatus::Error, 0.0, None)).is_empty());
    }
}
