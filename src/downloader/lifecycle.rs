//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::ImageDownloader;

/// Interval between in-flight checks while shutting down
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

impl ImageDownloader {
    /// Gracefully shut down the downloader
    ///
    /// 1. Stops accepting new requests
    ///    (`submit` returns [`Error::ShuttingDown`](crate::Error::ShuttingDown))
    /// 2. Waits up to `workers.shutdown_timeout` for in-flight requests to finish
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// In-flight fetches and writes are never cancelled; if the timeout expires they keep
    /// running in the background. Workers stop once the last downloader clone is dropped.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.state.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new requests");

        let timeout = self.config.workers.shutdown_timeout;
        match tokio::time::timeout(timeout, self.wait_for_in_flight()).await {
            Ok(()) => {
                tracing::info!("All in-flight requests completed");
            }
            Err(_) => {
                tracing::warn!(
                    in_flight = self.in_flight(),
                    "Timeout waiting for in-flight requests, proceeding with shutdown"
                );
            }
        }

        self.emit(Event::Shutdown);
        tracing::info!("Shutdown complete");
        Ok(())
    }

    async fn wait_for_in_flight(&self) {
        loop {
            let in_flight = self.in_flight();
            if in_flight == 0 {
                return;
            }

            tracing::debug!(in_flight, "Waiting for in-flight requests to complete");
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }
    }
}
