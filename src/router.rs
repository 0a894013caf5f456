//! Request routing: inbound messages in, `{ success, error }` out.
//!
//! Every message moves through `received -> dispatched -> succeeded | failed`.
//! Errors never escape the router; they are folded into a [`Response`].

use crate::downloader::ImageDownloader;
use crate::error::Error;
use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// Coarse classification of a failed request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseCode {
    /// The same download is already running
    AlreadyDownloading,
    /// Anything else went wrong
    Failed,
}

/// Reply to an inbound message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Whether the download completed
    pub success: bool,
    /// Human-readable failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ResponseCode>,
}

impl Response {
    /// Successful reply
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            code: None,
        }
    }

    /// Failed reply describing `error`
    pub fn failure(error: &Error) -> Self {
        let code = if error.is_already_in_progress() {
            ResponseCode::AlreadyDownloading
        } else {
            ResponseCode::Failed
        };
        Self {
            success: false,
            error: Some(error.to_string()),
            code: Some(code),
        }
    }
}

impl From<&Error> for Response {
    fn from(error: &Error) -> Self {
        Response::failure(error)
    }
}

impl ImageDownloader {
    /// Route a raw JSON message
    ///
    /// Messages that do not parse as an [`Intent`] fail immediately with an
    /// "unrecognized request" error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use carousel_dl::{Config, ImageDownloader};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = ImageDownloader::with_directory_sink(Config::default()).await?;
    /// let response = downloader
    ///     .handle_message(json!({
    ///         "action": "downloadImage",
    ///         "url": "https://example.com/cat",
    ///         "filename": "cat"
    ///     }))
    ///     .await;
    /// println!("success: {}", response.success);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn handle_message(&self, message: serde_json::Value) -> Response {
        tracing::debug!(state = "received", "Message received");

        match serde_json::from_value::<Intent>(message) {
            Ok(intent) => self.dispatch(intent).await,
            Err(e) => {
                tracing::warn!(state = "failed", error = %e, "Rejecting unrecognized message");
                Response::failure(&Error::Unrecognized)
            }
        }
    }

    /// Route a parsed intent to the matching download operation
    pub async fn dispatch(&self, intent: Intent) -> Response {
        tracing::debug!(state = "dispatched", items = intent.len(), "Dispatching intent");

        let result = match intent {
            Intent::DownloadOne { url, filename, .. } => {
                self.download_image(&url, &filename).await.map(|_| ())
            }
            Intent::DownloadMany { urls, label, .. } => {
                self.download_images(&urls, &label).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!(state = "succeeded", "Intent completed");
                Response::ok()
            }
            Err(e) => {
                tracing::debug!(state = "failed", error = %e, "Intent failed");
                Response::failure(&e)
            }
        }
    }
}
