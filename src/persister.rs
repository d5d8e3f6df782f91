//! Lossless PNG copies of fetched images.
//!
//! Files are named `<prefix><unix-millis>.png` inside the configured output
//! directory. Names are only unique to the millisecond: two saves landing in
//! the same millisecond write the same path and the later one wins.
//! The output directory is used as-is; if it is missing or read-only every
//! save fails with [`PersistError::Write`].

use crate::config::StorageConfig;
use crate::error::PersistError;
use crate::types::DecodedImage;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Abstraction over image storage, enabling testability.
///
/// Implementations do blocking I/O; the downloader calls them from the disk
/// worker inside `spawn_blocking`.
pub trait ImagePersister: Send + Sync {
    /// Write `image` to storage and return where it went
    fn persist(&self, image: &DecodedImage) -> std::result::Result<PathBuf, PersistError>;
}

/// Production [`ImagePersister`] writing PNG files named by wall-clock milliseconds.
#[derive(Clone, Debug)]
pub struct PngPersister {
    output_dir: PathBuf,
    file_prefix: String,
}

impl PngPersister {
    /// Create a persister for the configured directory and prefix
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Directory files are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target path for a save at `unix_millis`
    pub fn path_for(&self, unix_millis: i64) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.png", self.file_prefix, unix_millis))
    }
}

impl ImagePersister for PngPersister {
    fn persist(&self, image: &DecodedImage) -> std::result::Result<PathBuf, PersistError> {
        let path = self.path_for(chrono::Utc::now().timestamp_millis());
        let bytes = encode_png(image)?;

        std::fs::write(&path, bytes).map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

/// Encode `image` as PNG without losing any pixel data PNG can represent
///
/// 8- and 16-bit layouts are written unchanged. Floating point layouts, which
/// PNG cannot store, are converted to 16-bit RGBA.
pub fn encode_png(image: &DecodedImage) -> std::result::Result<Vec<u8>, PersistError> {
    let dynamic = image.as_dynamic();
    let mut buf = Cursor::new(Vec::new());

    match dynamic.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            DynamicImage::ImageRgba16(dynamic.to_rgba16()).write_to(&mut buf, ImageFormat::Png)?
        }
        _ => dynamic.write_to(&mut buf, ImageFormat::Png)?,
    }

    Ok(buf.into_inner())
}
