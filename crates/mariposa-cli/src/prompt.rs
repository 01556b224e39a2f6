//! The interactive wizard loop and its stdin prompts.

use anyhow::Result;
use std::io::{self, Write};

use mariposa_core::{ApiClient, AppError, Mode, Platform, Step, Wizard};

use crate::view::ConsoleView;

/// Run the interactive wizard until the user declines another download.
pub async fn run_wizard(client: ApiClient) -> Result<()> {
    println!("mariposa — media download wizard ({})", client.base_url());
    let mut wizard = Wizard::new(client, ConsoleView::new());

    loop {
        let platform = match menu(
            "What do you want to download?",
            &["YouTube video", "Instagram reel", "Music (track or playlist)"],
        )? {
            0 => Platform::Youtube,
            1 => Platform::Instagram,
            _ => Platform::Music,
        };
        wizard.select_platform(platform);

        if wizard.step() == Step::Mode {
            let mode = match menu(
                "Single track or a whole playlist?",
                &["Single track (MP3)", "Whole playlist (zipped MP3s)"],
            )? {
                0 => Mode::Single,
                _ => Mode::Playlist,
            };
            wizard.select_mode(mode);
        }

        // URL entry with a metadata-fetch self-loop: a failed fetch keeps
        // the wizard on this step.
        loop {
            let url = read_line("\nPaste the URL: ")?;
            match wizard.fetch_metadata(&url).await {
                Ok(()) => break,
                Err(AppError::Validation(message)) => println!("⚠ {}", message),
                // Backend and transport errors were already shown by the view.
                Err(_) => {}
            }
        }

        let fetched_playlist =
            wizard.state().media_info.as_ref().is_some_and(|info| info.is_playlist);
        if fetched_playlist {
            if confirm("Download the whole playlist?")? {
                // Completion and error screens come from the view.
                let _ = wizard.start_playlist_download().await;
            }
        } else {
            let labels: Vec<&str> = wizard.options().iter().map(|o| o.label.as_str()).collect();
            let choice = menu("Pick a quality:", &labels)?;
            wizard.select_quality(choice)?;
            let _ = wizard.start_download().await;
        }

        if !confirm("\nDownload another?")? {
            break;
        }
        wizard.reset();
    }
    Ok(())
}

/// Print a prompt and read one trimmed line from stdin.
fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Numbered menu; loops until a valid choice, returns its index.
fn menu<S: AsRef<str>>(title: &str, items: &[S]) -> io::Result<usize> {
    println!("\n{}", title);
    for (i, item) in items.iter().enumerate() {
        println!("  {}) {}", i + 1, item.as_ref());
    }
    loop {
        let input = read_line("> ")?;
        if let Ok(n) = input.parse::<usize>() {
            if (1..=items.len()).contains(&n) {
                return Ok(n - 1);
            }
        }
        println!("Please enter a number between 1 and {}.", items.len());
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let answer = read_line(&format!("{} [y/N] ", prompt))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
