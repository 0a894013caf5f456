//! Background staleness sweep for the download registry.

use crate::registry::DownloadRegistry;
use crate::types::Event;
use std::time::Duration;

use super::ImageDownloader;

impl ImageDownloader {
    /// Start the sweep task that evicts stale registry entries
    ///
    /// Runs every `registry.sweep_interval` until [`shutdown`](Self::shutdown)
    /// cancels it.
    pub(crate) fn start_sweeper(&self) -> tokio::task::JoinHandle<()> {
        spawn_sweeper(
            self.registry.clone(),
            self.config.registry.sweep_interval,
            self.event_tx.clone(),
            self.cancel_token.clone(),
        )
    }
}

/// Spawn a background task that periodically sweeps stale entries.
pub(crate) fn spawn_sweeper(
    registry: DownloadRegistry,
    period: Duration,
    event_tx: tokio::sync::broadcast::Sender<Event>,
    cancel_token: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Cancellation wins over a pending tick
                biased;
                _ = cancel_token.cancelled() => {
                    tracing::debug!("Registry sweeper stopped");
                    break;
                }
                _ = interval.tick() => {
                    let removed = registry.sweep();
                    if removed > 0 {
                        event_tx.send(Event::Swept { removed }).ok();
                    }
                }
            }
        }
    })
}
