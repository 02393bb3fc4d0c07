//! REST API server example
//!
//! This example shows how to run chapter-dl with the REST API enabled,
//! allowing control via HTTP endpoints.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:7070/swagger-ui
//! - Enqueue chapters via POST http://localhost:7070/jobs
//! - Drive and monitor jobs via GET http://localhost:7070/jobs/:job_id
//! - Browse sources via GET http://localhost:7070/sources

use chapter_dl::ChapterDownloader;
use chapter_dl::api::start_api_server;
use chapter_dl::config::{ApiConfig, Config, DownloadConfig};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Configure API
    let api_config = ApiConfig {
        bind_address: "127.0.0.1:7070".parse::<SocketAddr>()?,
        cors_enabled: true,
        cors_origins: vec!["*".to_string()],
        swagger_ui: true,
    };

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            chapters_dir: "chapters".into(),
            staging_dir: "staging".into(),
            ..Default::default()
        },
        server: api_config,
        ..Default::default()
    };

    // Create downloader instance and start the eviction sweep
    let downloader = Arc::new(ChapterDownloader::new(config.clone())?);
    let _eviction = downloader.spawn_eviction_task();
    let config = Arc::new(config);

    println!("🚀 Starting chapter-dl REST API server");
    println!("📖 Swagger UI: http://localhost:7070/swagger-ui");
    println!();
    println!("Example commands:");
    println!("  # Enqueue a chapter");
    println!("  curl -X POST http://localhost:7070/jobs \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!(
        "    -d '{{\"source_id\": \"en.mangapill\", \"manga_id\": \"/manga/2/one-piece\", \"chapter_id\": \"/chapters/2-11050000/one-piece-chapter-1105\"}}'"
    );
    println!();
    println!("  # Poll the job (each poll does one unit of work)");
    println!("  curl http://localhost:7070/jobs/<job_id>");
    println!();
    println!("  # Search a source");
    println!("  curl 'http://localhost:7070/sources/en.mangapill/manga?query=one+piece'");

    // Start the API server (runs indefinitely)
    start_api_server(downloader, config).await?;

    Ok(())
}
