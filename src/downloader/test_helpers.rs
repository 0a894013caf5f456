//! Shared test helpers for creating ImageDownloader instances in tests.

use crate::config::Config;
use crate::downloader::ImageDownloader;
use crate::error::{Error, Result};
use crate::registry::ManualClock;
use crate::sink::PersistenceSink;
use crate::types::DownloadHandle;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sink that keeps every payload in memory
#[derive(Default)]
pub(crate) struct RecordingSink {
    saved: Mutex<Vec<(String, Bytes)>>,
    next_id: AtomicU64,
}

impl RecordingSink {
    /// Saved (filename, payload) pairs in save order
    pub(crate) fn saved(&self) -> Vec<(String, Bytes)> {
        self.saved.lock().unwrap().clone()
    }

    /// Payload saved under `filename`
    pub(crate) fn payload(&self, filename: &str) -> Option<Bytes> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, bytes)| bytes.clone())
    }
}

#[async_trait]
impl PersistenceSink for RecordingSink {
    async fn persist(&self, payload: Bytes, filename: &str) -> Result<DownloadHandle> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), payload));
        Ok(DownloadHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            path: None,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Sink whose every save fails with an I/O error
pub(crate) struct FailingSink;

#[async_trait]
impl PersistenceSink for FailingSink {
    async fn persist(&self, _payload: Bytes, filename: &str) -> Result<DownloadHandle> {
        Err(Error::Io(std::io::Error::other(format!(
            "disk full while saving {filename}"
        ))))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Configuration with a fast sweep suitable for tests
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.registry.sweep_interval = Duration::from_millis(20);
    config
}

/// Helper to create a test ImageDownloader that records saved payloads.
pub(crate) async fn create_test_downloader() -> (ImageDownloader, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let downloader = ImageDownloader::new(test_config(), sink.clone())
        .await
        .unwrap();
    (downloader, sink)
}

/// Helper to create a test ImageDownloader driven by a manual clock.
pub(crate) async fn create_test_downloader_with_clock()
-> (ImageDownloader, Arc<RecordingSink>, Arc<ManualClock>) {
    let sink = Arc::new(RecordingSink::default());
    let clock = Arc::new(ManualClock::default());
    let downloader = ImageDownloader::with_clock(test_config(), sink.clone(), clock.clone())
        .await
        .unwrap();
    (downloader, sink, clock)
}
