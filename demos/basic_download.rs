//! Basic download example
//!
//! This example demonstrates the core functionality of chapter-dl:
//! - Configuring directories and the failure policy
//! - Creating a downloader instance
//! - Enqueuing a chapter
//! - Driving the job through the poll loop

use chapter_dl::config::{Config, DownloadConfig};
use chapter_dl::{ChapterDownloader, PollResponse};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            chapters_dir: "chapters".into(),
            staging_dir: "staging".into(),
            max_failure_ratio: 0.5,
            ..Default::default()
        },
        ..Default::default()
    };

    // Create downloader instance (registers the built-in sources)
    let downloader = ChapterDownloader::new(config)?;

    // Enqueue a chapter. Ids are source-local; browse them via the
    // search/chapters source API or take them from the site's URLs.
    let id = downloader
        .enqueue(
            "en.mangapill",
            "/manga/2/one-piece",
            "/chapters/2-11050000/one-piece-chapter-1105",
        )
        .await?;
    println!("enqueued job {id}");

    // Each poll performs one bounded unit of work
    loop {
        match downloader.poll(&id).await {
            PollResponse::Pending { current, total } => {
                if total > 0 {
                    println!("downloading page {current}/{total}");
                } else {
                    println!("resolving page list...");
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            PollResponse::Completed {
                artifact_path,
                warnings,
            } => {
                println!("done: {artifact_path}");
                for warning in warnings {
                    println!("  warning: {warning}");
                }
                break;
            }
            PollResponse::Failed { message } => {
                eprintln!("failed: {message}");
                break;
            }
        }
    }

    Ok(())
}
