//! Core types for image-dl

use image::{ColorType, DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Process-local identifier for one submitted request
///
/// Only used to correlate events and log lines. Two requests for the same URL
/// get different ids; nothing is deduplicated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Create a new RequestId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully decoded raster image
///
/// Immutable once created. Clones share the same pixel buffer, so handing an
/// image to both the result list and the persister copies no pixels.
#[derive(Clone)]
pub struct DecodedImage {
    inner: Arc<DynamicImage>,
}

impl DecodedImage {
    /// Wrap a decoded image
    pub fn new(image: DynamicImage) -> Self {
        Self {
            inner: Arc::new(image),
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Pixel layout of the buffer
    pub fn color(&self) -> ColorType {
        self.inner.color()
    }

    /// Raw pixel buffer, row-major, laid out per [`color`](Self::color)
    pub fn pixels(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Borrow the underlying `image` representation (for rendering)
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }
}

impl From<DynamicImage> for DecodedImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl PartialEq for DecodedImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.dimensions() == other.dimensions()
                && self.color() == other.color()
                && self.pixels() == other.pixels())
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("color", &self.color())
            .finish()
    }
}

/// Where a single request currently is in the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not started, or finished
    Idle,
    /// Waiting on the network worker
    Fetching,
    /// Waiting on the disk worker
    Persisting,
}

/// Event emitted during a request's lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Input was blank; nothing was fetched
    Rejected,

    /// Fetch handed to the network worker
    Fetching {
        /// Request ID
        id: RequestId,
        /// Requested URL
        url: String,
    },

    /// Fetch or decode failed; the request ends here
    FetchFailed {
        /// Request ID
        id: RequestId,
        /// Requested URL
        url: String,
        /// Error message
        error: String,
    },

    /// Decoded image appended to the result list
    Appended {
        /// Request ID
        id: RequestId,
        /// Position in the result list
        index: usize,
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
    },

    /// Persist handed to the disk worker
    Persisting {
        /// Request ID
        id: RequestId,
    },

    /// PNG copy written
    Persisted {
        /// Request ID
        id: RequestId,
        /// Written file
        path: PathBuf,
    },

    /// PNG copy could not be written; the list entry is kept
    PersistFailed {
        /// Request ID
        id: RequestId,
        /// Error message
        error: String,
    },

    /// Downloader shut down
    Shutdown,
}

/// How one invocation of the pipeline ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Input was blank; no fetch was attempted
    Rejected,
    /// Fetch or decode failed; nothing was appended or written
    FetchFailed,
    /// Image appended at `index` and saved to `path`
    Saved {
        /// Position in the result list
        index: usize,
        /// Written file
        path: PathBuf,
    },
    /// Image appended at `index` but the PNG copy failed
    SaveFailed {
        /// Position in the result list
        index: usize,
        /// Error message
        error: String,
    },
}

impl Outcome {
    /// Whether an image was appended to the result list
    pub fn appended(&self) -> bool {
        matches!(self, Outcome::Saved { .. } | Outcome::SaveFailed { .. })
    }
}
