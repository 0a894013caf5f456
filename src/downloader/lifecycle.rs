//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;

use super::ImageDownloader;

impl ImageDownloader {
    /// Gracefully shut down the downloader
    ///
    /// Stops the registry sweep and notifies subscribers. Downloads that are
    /// still running finish on their own; their registry entries are released
    /// as they complete.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.cancel_token.cancel();

        let in_flight = self.registry.len();
        if in_flight > 0 {
            tracing::warn!(in_flight, "Shutting down with downloads still in flight");
        }

        let _ = self.event_tx.send(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
