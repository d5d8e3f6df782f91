//! Error types for image-dl
//!
//! The pipeline distinguishes three families of failure:
//! - [`FetchError`] - anything that goes wrong while downloading or decoding an image
//! - [`PersistError`] - anything that goes wrong while encoding or writing the PNG copy
//! - [`Error`] - pipeline-level faults (configuration, shutdown, lost workers)
//!
//! Fetch and persist failures are normally absorbed by the coordinator and reported
//! through [`Outcome`](crate::types::Outcome) and events. Only [`Error`] reaches the caller
//! of [`ImageDownloader::submit`](crate::ImageDownloader::submit).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for image-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for image-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "storage.file_prefix")
        key: Option<String>,
    },

    /// Image fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Image persist failed
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),

    /// Shutdown in progress - not accepting new requests
    #[error("shutdown in progress: not accepting new requests")]
    ShuttingDown,

    /// A worker queue was closed or the job running on it panicked
    #[error("{worker} worker unavailable")]
    WorkerUnavailable {
        /// Name of the worker ("network" or "disk")
        worker: &'static str,
    },
}

/// Errors produced while fetching and decoding an image
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be built or sent (malformed URL, DNS, refused connection, ...)
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The HTTP status code returned
        status: u16,
        /// The requested URL
        url: String,
    },

    /// The connection dropped while reading the body
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The body exceeded the configured size limit
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// Configured maximum body size in bytes
        limit: u64,
        /// The requested URL
        url: String,
    },

    /// The body is not a decodable raster image
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The blocking decode task panicked or was aborted
    #[error("decode task failed: {0}")]
    DecodeTask(String),
}

/// Errors produced while writing an image to storage
#[derive(Debug, Error)]
pub enum PersistError {
    /// The image could not be encoded as PNG
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    /// The blocking encode/write task panicked or was aborted
    #[error("persist task failed: {0}")]
    Task(String),

    /// The encoded file could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a configuration error for a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
