//! Shared test helpers for creating ImageDownloader instances in tests.

use crate::config::Config;
use crate::downloader::ImageDownloader;
use crate::error::{FetchError, PersistError};
use crate::fetcher::ImageFetcher;
use crate::persister::{ImagePersister, PngPersister};
use crate::types::DecodedImage;
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Canned response for one URL
#[derive(Clone, Copy, Debug)]
pub(crate) enum Stub {
    /// Decoded image of the given size
    Image(u32, u32),
    /// Non-2xx status
    Status(u16),
}

/// In-memory [`ImageFetcher`] that serves canned responses and records calls
#[derive(Default)]
pub(crate) struct StubFetcher {
    responses: HashMap<String, Stub>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, url: &str, stub: Stub) -> Self {
        self.responses.insert(url.to_string(), stub);
        self
    }

    pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs fetched so far, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of fetches ever running at once
    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<DecodedImage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.responses.get(url).copied().unwrap_or(Stub::Status(404)) {
            Stub::Image(width, height) => Ok(solid_image(width, height)),
            Stub::Status(status) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
        }
    }
}

/// [`ImagePersister`] that always fails like a read-only directory
pub(crate) struct FailingPersister;

impl ImagePersister for FailingPersister {
    fn persist(&self, _image: &DecodedImage) -> Result<PathBuf, PersistError> {
        Err(PersistError::Write {
            path: PathBuf::from("/readonly/downloaded_image_0.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

/// [`ImagePersister`] that sleeps before delegating, to hold the disk worker busy
pub(crate) struct SlowPersister {
    pub(crate) inner: PngPersister,
    pub(crate) delay: Duration,
}

impl ImagePersister for SlowPersister {
    fn persist(&self, image: &DecodedImage) -> Result<PathBuf, PersistError> {
        std::thread::sleep(self.delay);
        self.inner.persist(image)
    }
}

/// Solid-color RGB image of the given size
pub(crate) fn solid_image(width: u32, height: u32) -> DecodedImage {
    DecodedImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb([12, 34, 56]),
    )))
}

/// Config writing into `dir` with small queues
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.output_dir = dir.to_path_buf();
    config.workers.queue_capacity = 8;
    config.workers.event_capacity = 64;
    config.workers.shutdown_timeout = Duration::from_secs(5);
    config
}

/// Helper to create a test ImageDownloader backed by `fetcher` and a real PNG persister.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(
    fetcher: Arc<StubFetcher>,
) -> (ImageDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let persister = Arc::new(PngPersister::new(&config.storage));
    let downloader = ImageDownloader::with_components(config, fetcher, persister).unwrap();
    (downloader, temp_dir)
}

/// Names of the PNG files in `dir`, sorted
pub(crate) fn saved_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".png"))
        .collect();
    names.sort();
    names
}
