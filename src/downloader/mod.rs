//! Core downloader implementation split into focused submodules.
//!
//! The `ImageDownloader` struct and its methods are organized by domain:
//! - [`single`] - Single image download
//! - [`batch`] - Multi-image archive download
//! - [`lifecycle`] - Shutdown coordination
//! - [`background_tasks`] - Staleness sweep of the download registry
//!
//! Message routing lives in [`crate::router`].

mod background_tasks;
mod batch;
mod lifecycle;
mod single;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::ImageFetcher;
use crate::registry::{Clock, DownloadRegistry, SystemClock};
use crate::sink::{DirectorySink, PersistenceSink};
use crate::types::{DownloadHandle, Event};
use bytes::Bytes;
use std::sync::Arc;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ImageDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// In-flight operations, keyed by (resource, filename)
    pub(crate) registry: DownloadRegistry,
    /// HTTP client used for every image
    pub(crate) fetcher: ImageFetcher,
    /// Where finished payloads go (trait object for pluggable backends)
    pub(crate) sink: Arc<dyn PersistenceSink>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Stops background tasks on shutdown
    pub(crate) cancel_token: tokio_util::sync::CancellationToken,
}

impl std::fmt::Debug for ImageDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDownloader")
            .field("registry", &self.registry)
            .field("sink", &self.sink.name())
            .finish_non_exhaustive()
    }
}

impl ImageDownloader {
    /// Create a new ImageDownloader that saves into `sink`
    ///
    /// Validates the configuration, builds the HTTP client and starts the
    /// registry staleness sweep. Must be called from within a tokio runtime.
    pub async fn new(config: Config, sink: Arc<dyn PersistenceSink>) -> Result<Self> {
        Self::with_clock(config, sink, Arc::new(SystemClock)).await
    }

    /// Create a downloader that writes into `config.output.download_dir`
    pub async fn with_directory_sink(config: Config) -> Result<Self> {
        let sink = Arc::new(DirectorySink::from_config(&config.output));
        Self::new(config, sink).await
    }

    /// Create a downloader whose registry reads time from `clock`
    pub async fn with_clock(
        config: Config,
        sink: Arc<dyn PersistenceSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let fetcher = ImageFetcher::new(&config.fetch)?;
        let registry = DownloadRegistry::with_clock(config.registry.stale_after, clock);

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let downloader = Self {
            config: Arc::new(config),
            registry,
            fetcher,
            sink,
            event_tx,
            cancel_token: tokio_util::sync::CancellationToken::new(),
        };

        downloader.start_sweeper();

        tracing::info!(
            sink = downloader.sink.name(),
            stale_after_secs = downloader.config.registry.stale_after.as_secs(),
            sweep_interval_secs = downloader.config.registry.sweep_interval.as_secs(),
            "Image downloader initialized"
        );

        Ok(downloader)
    }

    /// Subscribe to download events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than 1000 events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use carousel_dl::{Config, ImageDownloader};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = ImageDownloader::with_directory_sink(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "download event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Registry of in-flight operations
    pub fn registry(&self) -> &DownloadRegistry {
        &self.registry
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped (ok() converts Err to None).
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Hand a finished payload to the sink
    ///
    /// Any sink error is reported as [`Error::PersistenceFailed`].
    pub(crate) async fn persist(&self, payload: Bytes, filename: &str) -> Result<DownloadHandle> {
        let size_bytes = payload.len() as u64;
        let handle = self
            .sink
            .persist(payload, filename)
            .await
            .map_err(|e| match e {
                Error::PersistenceFailed(_) => e,
                other => Error::PersistenceFailed(other.to_string()),
            })?;

        tracing::info!(filename, size_bytes, sink = self.sink.name(), "Saved");
        self.emit_event(Event::Saved {
            filename: filename.to_string(),
            size_bytes,
        });

        Ok(handle)
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on the configured bind address (default: 127.0.0.1:6790).
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = Arc::new(self.clone());
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
