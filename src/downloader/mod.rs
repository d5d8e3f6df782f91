//! Core downloader implementation split into focused submodules.
//!
//! - [`pipeline`] - per-request coordination (fetch, append, persist)
//! - [`lifecycle`] - shutdown coordination

mod lifecycle;
mod pipeline;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, PersistError, Result};
use crate::fetcher::{HttpFetcher, ImageFetcher};
use crate::persister::{ImagePersister, PngPersister};
use crate::results::ResultList;
use crate::types::{DecodedImage, Event, RequestId};
use crate::worker::SerialWorker;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// The two single-slot execution contexts
#[derive(Clone)]
pub(crate) struct Workers {
    /// Runs fetches, one at a time
    pub(crate) network: SerialWorker,
    /// Runs PNG writes, one at a time
    pub(crate) disk: SerialWorker,
}

/// Request bookkeeping shared by all clones
#[derive(Clone)]
pub(crate) struct RequestState {
    /// Source of request ids
    pub(crate) next_id: Arc<AtomicU64>,
    /// Requests between acceptance and their final outcome
    pub(crate) in_flight: Arc<AtomicUsize>,
    /// Flag to indicate whether new requests are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl RequestState {
    fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            accepting_new: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Every clone shares the same workers, result list and event channel, so a
/// UI can hand clones to button handlers freely.
#[derive(Clone)]
pub struct ImageDownloader {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Images fetched so far, in arrival order
    pub(crate) results: ResultList,
    /// Network retrieval (trait object for pluggable implementations)
    pub(crate) fetcher: Arc<dyn ImageFetcher>,
    /// Disk storage (trait object for pluggable implementations)
    pub(crate) persister: Arc<dyn ImagePersister>,
    /// Network and disk workers
    pub(crate) workers: Workers,
    /// Request ids, in-flight tracking and shutdown flag
    pub(crate) state: RequestState,
}

impl ImageDownloader {
    /// Create a new ImageDownloader using HTTP fetching and PNG files
    ///
    /// This validates the configuration, builds the HTTP client, and spawns the
    /// network and disk workers on the current tokio runtime.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        let persister = Arc::new(PngPersister::new(&config.storage));

        // Saves will fail until the directory exists; say so once up front
        match tokio::fs::metadata(&config.storage.output_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => tracing::warn!(
                output_dir = %config.storage.output_dir.display(),
                "Output path is not a directory, saving images will fail"
            ),
            Err(e) => tracing::warn!(
                output_dir = %config.storage.output_dir.display(),
                error = %e,
                "Output directory is not accessible, saving images will fail"
            ),
        }

        Self::with_components(config, fetcher, persister)
    }

    /// Create an ImageDownloader with custom fetch and persist implementations
    ///
    /// Must be called from within a tokio runtime, since both workers are
    /// spawned immediately.
    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn ImageFetcher>,
        persister: Arc<dyn ImagePersister>,
    ) -> Result<Self> {
        config.validate()?;

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(Error::Config {
                message: "ImageDownloader must be created inside a tokio runtime".to_string(),
                key: None,
            });
        }

        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.workers.event_capacity);

        let workers = Workers {
            network: SerialWorker::spawn("network", config.workers.queue_capacity),
            disk: SerialWorker::spawn("disk", config.workers.queue_capacity),
        };

        let results = ResultList::new(config.workers.event_capacity);

        tracing::info!(
            output_dir = %config.storage.output_dir.display(),
            queue_capacity = config.workers.queue_capacity,
            "Image downloader initialized"
        );

        Ok(Self {
            event_tx,
            config: Arc::new(config),
            results,
            fetcher,
            persister,
            workers,
            state: RequestState::new(),
        })
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls more than `workers.event_capacity` events behind receives
    /// `RecvError::Lagged` and skips ahead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use image_dl::{Config, ImageDownloader};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = ImageDownloader::new(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("event: {:?}", event);
    ///         }
    ///     });
    ///
    ///     downloader.submit("https://example.com/cat.jpg").await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The shared result list a display renders
    pub fn results(&self) -> &ResultList {
        &self.results
    }

    /// Get the current configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Whether new requests are still accepted
    pub fn is_accepting(&self) -> bool {
        self.state.accepting_new.load(Ordering::SeqCst)
    }

    /// Number of requests currently between acceptance and outcome
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Fetch and decode one image on the network worker, without touching the result list
    pub async fn fetch(&self, url: &str) -> Result<DecodedImage> {
        Ok(self.fetch_on_worker(url.to_string()).await??)
    }

    /// Save one image on the disk worker, without touching the result list
    pub async fn persist(&self, image: DecodedImage) -> Result<PathBuf> {
        Ok(self.persist_on_worker(image).await??)
    }

    pub(crate) async fn fetch_on_worker(
        &self,
        url: String,
    ) -> Result<std::result::Result<DecodedImage, crate::error::FetchError>> {
        let fetcher = Arc::clone(&self.fetcher);
        self.workers
            .network
            .run(async move { fetcher.fetch(&url).await })
            .await
    }

    pub(crate) async fn persist_on_worker(
        &self,
        image: DecodedImage,
    ) -> Result<std::result::Result<PathBuf, PersistError>> {
        let persister = Arc::clone(&self.persister);
        self.workers
            .disk
            .run(async move {
                // The worker slot stays occupied until the blocking write returns
                match tokio::task::spawn_blocking(move || persister.persist(&image)).await {
                    Ok(result) => result,
                    Err(e) => Err(PersistError::Task(e.to_string())),
                }
            })
            .await
    }

    pub(crate) fn next_request_id(&self) -> RequestId {
        RequestId(self.state.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for ImageDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDownloader")
            .field("output_dir", &self.config.storage.output_dir)
            .field("results", &self.results)
            .field("in_flight", &self.in_flight())
            .field("accepting_new", &self.is_accepting())
            .finish()
    }
}
