//! Per-request coordination: fetch, append, persist.
//!
//! Each call to [`ImageDownloader::submit`] walks one request through
//! `Idle -> Fetching -> (Persisting | Idle)`. The fetch runs on the network
//! worker and the write on the disk worker; the caller's task only awaits them
//! and mutates the result list in between.

use crate::error::{Error, Result};
use crate::types::{Event, Outcome, Phase};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::ImageDownloader;

/// Counts a request as in flight until dropped
struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ImageDownloader {
    /// Run the pipeline for one user-supplied URL
    ///
    /// Blank or whitespace-only input is ignored and returns [`Outcome::Rejected`]
    /// without fetching. Otherwise the URL is fetched as-is on the network
    /// worker. A failed fetch ends the request quietly with
    /// [`Outcome::FetchFailed`]. A successful fetch is appended to
    /// [`results`](Self::results) *before* the PNG copy is written on the disk
    /// worker. A failed write is reported as [`Outcome::SaveFailed`]; the list
    /// entry stays.
    ///
    /// There is no retry, no cancellation and no timeout beyond the optional
    /// transport timeout in the fetch config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown) and
    /// [`Error::WorkerUnavailable`] if a worker job panicked. Fetch and persist
    /// failures are never returned as errors.
    pub async fn submit(&self, input: &str) -> Result<Outcome> {
        if input.trim().is_empty() {
            tracing::debug!("Ignoring blank input");
            self.emit(Event::Rejected);
            return Ok(Outcome::Rejected);
        }

        // Count the request before checking the flag so shutdown never misses it
        let _in_flight = InFlightGuard::new(&self.state.in_flight);
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        let id = self.next_request_id();
        let url = input.to_string();

        tracing::debug!(request_id = id.0, url = %url, phase = ?Phase::Fetching, "Fetching image");
        self.emit(Event::Fetching {
            id,
            url: url.clone(),
        });

        let image = match self.fetch_on_worker(url.clone()).await? {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!(
                    request_id = id.0,
                    url = %url,
                    error = %e,
                    phase = ?Phase::Idle,
                    "Fetch failed, dropping request"
                );
                self.emit(Event::FetchFailed {
                    id,
                    url,
                    error: e.to_string(),
                });
                return Ok(Outcome::FetchFailed);
            }
        };

        let (width, height) = image.dimensions();
        let index = self.results.push(image.clone());
        tracing::debug!(request_id = id.0, index, width, height, "Image appended");
        self.emit(Event::Appended {
            id,
            index,
            width,
            height,
        });

        tracing::debug!(request_id = id.0, phase = ?Phase::Persisting, "Saving image");
        self.emit(Event::Persisting { id });

        let outcome = match self.persist_on_worker(image).await? {
            Ok(path) => {
                tracing::info!(request_id = id.0, path = %path.display(), "Image saved");
                self.emit(Event::Persisted {
                    id,
                    path: path.clone(),
                });
                Outcome::Saved { index, path }
            }
            Err(e) => {
                tracing::warn!(request_id = id.0, index, error = %e, "Failed to save image");
                self.emit(Event::PersistFailed {
                    id,
                    error: e.to_string(),
                });
                Outcome::SaveFailed {
                    index,
                    error: e.to_string(),
                }
            }
        };

        tracing::debug!(request_id = id.0, phase = ?Phase::Idle, "Request finished");
        Ok(outcome)
    }

    /// Start [`submit`](Self::submit) in the background and return immediately
    ///
    /// This is the entry point for a button handler. Overlapping calls are not
    /// guarded against: each call becomes an independent request, their fetches
    /// queue on the network worker and their writes on the disk worker.
    pub fn spawn_submit(
        &self,
        input: impl Into<String>,
    ) -> tokio::task::JoinHandle<Result<Outcome>> {
        let downloader = self.clone();
        let input = input.into();
        tokio::spawn(async move { downloader.submit(&input).await })
    }
}
