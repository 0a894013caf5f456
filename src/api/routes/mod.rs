//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`messages`] - Extension message routing
//! - [`downloads`] - Direct download operations and in-flight listing
//! - [`system`] - Health and events

use serde::{Deserialize, Serialize};

mod downloads;
mod messages;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use downloads::*;
pub use messages::*;
pub use system::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /downloads/image
#[derive(Debug, Deserialize, Serialize)]
pub struct DownloadImageRequest {
    /// Image URL
    pub url: String,
    /// Requested filename (sanitized before saving)
    pub filename: String,
}

/// Request body for POST /downloads/batch
#[derive(Debug, Deserialize, Serialize)]
pub struct DownloadBatchRequest {
    /// Image URLs in the order they should appear in the archive
    pub urls: Vec<String>,
    /// Archive label (sanitized before use)
    pub label: String,
}
