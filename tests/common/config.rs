//! Test configuration helpers for creating downloaders backed by a temp directory

use carousel_dl::{Config, FileCollisionAction, ImageDownloader};
use std::time::Duration;
use tempfile::TempDir;

/// Configuration writing into `dir` with a fast registry sweep
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.output.download_dir = dir.path().join("downloads");
    config.output.file_collision = FileCollisionAction::Rename;
    config.registry.sweep_interval = Duration::from_millis(50);
    config
}

/// Create a downloader that saves into a fresh temp directory
///
/// Returns the downloader and the tempdir (which must be kept alive).
pub async fn create_downloader() -> (ImageDownloader, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let downloader = ImageDownloader::with_directory_sink(test_config(&dir))
        .await
        .expect("failed to create downloader");
    (downloader, dir)
}
