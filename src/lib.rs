//! # carousel-dl
//!
//! Download orchestration for image carousels: single images, multi-image
//! ZIP archives and duplicate suppression for requests that are in flight.
//!
//! ## Design Philosophy
//!
//! carousel-dl is designed to be:
//! - **Library-first** - The browser extension (or any client) only sends intents
//! - **Failure-tolerant** - A broken image in a batch becomes an error entry, not a failed batch
//! - **Duplicate-safe** - The same download is never run twice at once
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use carousel_dl::{Config, ImageDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ImageDownloader::with_directory_sink(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let urls = vec![
//!         "https://images.example/1.jpg".to_string(),
//!         "https://images.example/2.jpg".to_string(),
//!     ];
//!     let report = downloader.download_images(&urls, "My Post").await?;
//!     println!("saved {} ({} failed)", report.filename, report.failed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Batch archive assembly
pub mod archive;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// HTTP image retrieval
pub mod fetcher;
/// Download intents
pub mod intent;
/// In-flight download registry
pub mod registry;
/// Message routing
pub mod router;
/// Filename sanitization
pub mod sanitize;
/// Persistence sink boundary
pub mod sink;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;
/// Watermark removal for image URLs
pub mod watermark;

// Re-export commonly used types
pub use config::{Config, FileCollisionAction};
pub use downloader::ImageDownloader;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use intent::{DownloadFormat, Intent};
pub use registry::{Clock, DownloadRegistry, ManualClock, RegistryGuard, SystemClock};
pub use router::{Response, ResponseCode};
pub use sink::{DirectorySink, PersistenceSink};
pub use types::{BatchReport, DownloadHandle, DownloadKey, DownloadingEntry, Event, SavedFile};

