//! Common test utilities for image-dl integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;

use image_dl::{Config, ImageDownloader};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Downloader writing into a fresh temp directory, using the real HTTP fetcher
pub async fn http_downloader() -> (ImageDownloader, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let downloader = ImageDownloader::new(config_for(temp_dir.path()))
        .await
        .expect("Failed to create downloader");
    (downloader, temp_dir)
}

/// Config writing into `dir`
pub fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.output_dir = dir.to_path_buf();
    config.workers.shutdown_timeout = Duration::from_secs(5);
    config
}

/// Serve `body` with status 200 at `route`
#[allow(dead_code)]
pub async fn serve_bytes(server: &MockServer, route: &str, content_type: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", content_type)
                .set_body_bytes(body),
        )
        .mount(server)
        .await;
}

/// Serve an empty response with `status` at `route`
#[allow(dead_code)]
pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// PNG files in `dir`, sorted by name
#[allow(dead_code)]
pub fn png_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .expect("Failed to read output dir")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    files.sort();
    files
}
