use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;

use mariposa_core::{
    config, ApiClient, Backend, Mode, Platform, QualityChoice, QualityKind, Step, Wizard,
};

mod prompt;
mod view;

use view::ConsoleView;

#[derive(Parser)]
#[command(name = "mariposa")]
#[command(author, version, about = "Console client for the mariposa media-download service", long_about = None)]
struct Cli {
    /// Base URL of the service (overrides MARIPOSA_SERVER)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print metadata for a URL
    Info {
        /// Source URL
        #[arg(short, long)]
        url: String,

        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Download one URL without the interactive wizard
    Download {
        /// Source URL
        #[arg(short, long)]
        url: String,

        /// Download audio only (MP3)
        #[arg(long)]
        audio: bool,

        /// Specific resolution (video) or bitrate (audio); best if omitted
        #[arg(short, long)]
        quality: Option<String>,

        /// Treat the URL as a playlist (zipped MP3s)
        #[arg(long)]
        playlist: bool,

        /// Directory to save into (defaults to DOWNLOAD_FOLDER)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env if present, then init logging.
    let _ = dotenv();
    init_logger()?;

    let server = cli.server.unwrap_or_else(|| config::SERVER_URL.clone());
    let client = ApiClient::new(&server)?;
    log::debug!("Using server {}", client.base_url());

    match cli.command {
        Some(Commands::Info { url, json }) => run_info(client, &url, json).await,
        Some(Commands::Download { url, audio, quality, playlist, output }) => {
            run_download(client, &url, audio, quality, playlist, output).await
        }
        None => prompt::run_wizard(client).await,
    }
}

/// Console logger at warn level so log lines do not fight the wizard's own
/// output; MARIPOSA_LOG_FILE additionally captures debug logs to a file.
fn init_logger() -> Result<()> {
    use simplelog::*;

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Ok(path) = std::env::var("MARIPOSA_LOG_FILE") {
        let file = std::fs::File::create(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create log file {}: {}", path, e))?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
    }
    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;
    Ok(())
}

/// One-shot metadata fetch.
async fn run_info(client: ApiClient, url: &str, json: bool) -> Result<()> {
    let info = client.fetch_info(url).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.title);
    if let Some(channel) = &info.channel {
        println!("  by {}", channel);
    }
    if let Some(duration) = info.duration_display() {
        println!("  duration {}", duration);
    }
    if info.is_playlist {
        println!("  playlist with {} entries", info.count.unwrap_or(0));
    }
    for q in &info.video_qualities {
        println!("  video: {}", q.label);
    }
    for q in &info.audio_qualities {
        println!("  audio: {}", q.label);
    }
    Ok(())
}

/// One-shot download through the same controller path the wizard uses.
async fn run_download(
    client: ApiClient,
    url: &str,
    audio: bool,
    quality: Option<String>,
    playlist: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let parsed = url::Url::parse(url)?;
    let platform = if playlist { Platform::Music } else { Platform::from_url(&parsed) };

    let mut wizard = Wizard::new(client, ConsoleView::new());
    if let Some(dir) = output {
        wizard = wizard.with_download_dir(dir);
    }

    wizard.select_platform(platform);
    if wizard.step() == Step::Mode {
        wizard.select_mode(if playlist { Mode::Playlist } else { Mode::Single });
    }
    wizard.fetch_metadata(url).await?;

    let fetched_playlist =
        wizard.state().media_info.as_ref().is_some_and(|info| info.is_playlist);
    if fetched_playlist {
        wizard.start_playlist_download().await?;
        return Ok(());
    }
    if playlist {
        bail!("--playlist was given but the service reports a single item");
    }

    if audio || quality.is_some() {
        match pick_option(wizard.options(), platform, audio, quality.as_deref()) {
            Some(i) => wizard.select_quality(i)?,
            None => {
                let offered: Vec<&str> =
                    wizard.options().iter().map(|o| o.label.as_str()).collect();
                bail!("requested quality not offered; available: {}", offered.join(", "));
            }
        }
    }
    // Otherwise the pre-selected first option (highest quality) is used.

    wizard.start_download().await?;
    Ok(())
}

/// Resolve `--audio`/`--quality` flags to an offered option. Music sources
/// only list audio bitrates, so a bare `--quality` there means audio.
fn pick_option(
    options: &[QualityChoice],
    platform: Platform,
    audio: bool,
    quality: Option<&str>,
) -> Option<usize> {
    let want_kind = if audio || platform == Platform::Music {
        QualityKind::Audio
    } else {
        QualityKind::Video
    };
    options.iter().position(|option| {
        option.quality.kind == want_kind
            && match quality {
                Some(value) => option.quality.value == value,
                None => option.quality.is_best() || want_kind == QualityKind::Audio,
            }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mariposa_core::Quality;
    use pretty_assertions::assert_eq;

    fn music_options() -> Vec<QualityChoice> {
        vec![
            QualityChoice { label: "320 kbps MP3".to_string(), quality: Quality::audio("320") },
            QualityChoice { label: "160 kbps MP3".to_string(), quality: Quality::audio("160") },
        ]
    }

    fn youtube_options() -> Vec<QualityChoice> {
        vec![
            QualityChoice { label: "1080p".to_string(), quality: Quality::video("1080") },
            QualityChoice { label: "720p".to_string(), quality: Quality::video("720") },
            QualityChoice { label: "Best Audio (MP3)".to_string(), quality: Quality::audio("best") },
        ]
    }

    #[test]
    fn test_bitrate_on_music_resolves_without_audio_flag() {
        assert_eq!(pick_option(&music_options(), Platform::Music, false, Some("320")), Some(0));
        assert_eq!(pick_option(&music_options(), Platform::Music, false, Some("160")), Some(1));
    }

    #[test]
    fn test_resolution_matches_video_option() {
        assert_eq!(pick_option(&youtube_options(), Platform::Youtube, false, Some("720")), Some(1));
    }

    #[test]
    fn test_audio_flag_picks_best_audio() {
        assert_eq!(pick_option(&youtube_options(), Platform::Youtube, true, None), Some(2));
    }

    #[test]
    fn test_unoffered_quality_is_none() {
        assert_eq!(pick_option(&youtube_options(), Platform::Youtube, false, Some("480")), None);
    }
}
