//! # image-dl
//!
//! Backend library for "paste a link, get the picture" screens: fetch an image
//! from a URL, keep it in an observable list for display, and save a lossless
//! PNG copy to the user's Documents directory.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No UI, purely a Rust crate for embedding behind one
//! - **Two single-slot workers** - Fetches run one at a time on a network worker,
//!   writes one at a time on a disk worker, so neither blocks the other or the caller
//! - **Quiet failures** - A bad URL or broken image is dropped without an error;
//!   a failed save is reported but never fatal
//! - **Event-driven** - The display subscribes to appended images, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use image_dl::{Config, ImageDownloader, Outcome};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ImageDownloader::new(Config::default()).await?;
//!
//!     // Render each image as it arrives
//!     let results = downloader.results().clone();
//!     let mut appended = results.subscribe();
//!     tokio::spawn(async move {
//!         let mut shown = 0;
//!         loop {
//!             let batch = match appended.recv().await {
//!                 Ok(entry) => vec![entry],
//!                 // Fell behind: catch up from the list itself
//!                 Err(RecvError::Lagged(_)) => results.since(shown),
//!                 Err(RecvError::Closed) => break,
//!             };
//!             for entry in batch {
//!                 if entry.index >= shown {
//!                     println!("#{}: {}x{}", entry.index, entry.image.width(), entry.image.height());
//!                     shown = entry.index + 1;
//!                 }
//!             }
//!         }
//!     });
//!
//!     match downloader.submit("https://example.com/cat.jpg").await? {
//!         Outcome::Saved { path, .. } => println!("saved to {}", path.display()),
//!         other => println!("{:?}", other),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Request coordination (the pipeline)
pub mod downloader;
/// Error types
pub mod error;
/// Image retrieval
pub mod fetcher;
/// PNG storage
pub mod persister;
/// Append-only result list
pub mod results;
/// Core types and events
pub mod types;
/// Single-slot background workers
pub mod worker;

// Re-export commonly used types
pub use config::{Config, FetchConfig, StorageConfig, WorkerConfig};
pub use downloader::ImageDownloader;
pub use error::{Error, FetchError, PersistError, Result};
pub use fetcher::{HttpFetcher, ImageFetcher};
pub use persister::{ImagePersister, PngPersister};
pub use results::{Appended, ResultList};
pub use types::{DecodedImage, Event, Outcome, Phase, RequestId};
pub use worker::SerialWorker;

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use image_dl::{Config, ImageDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = ImageDownloader::new(Config::default()).await?;
///     downloader.spawn_submit("https://example.com/cat.jpg");
///
///     run_with_shutdown(downloader).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: ImageDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(
                error = %e,
                "Could not register SIGTERM handler, waiting for SIGINT only"
            );
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(
                error = %e,
                "Could not register SIGINT handler, waiting for SIGTERM only"
            );
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(
                error = %e,
                "Could not register any signal handlers, using ctrl_c fallback"
            );
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
