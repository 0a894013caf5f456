//! Core types for carousel-dl

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity of one in-flight operation
///
/// Two requests with the same key are duplicates regardless of payload.
/// For single images `resource` is the image URL; for batches it is the
/// digest of the URL set (see [`DownloadKey::for_batch`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadKey {
    /// Resource identifier (URL or batch digest)
    pub resource: String,
    /// Target filename
    pub filename: String,
}

impl DownloadKey {
    /// Key for a single image request
    pub fn new(resource: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            filename: filename.into(),
        }
    }

    /// Key for a batch request.
    ///
    /// The resource part is the SHA-256 of the sorted, de-duplicated URL set,
    /// so `[A, B]` and `[B, A]` collide while `[A, C]` does not.
    pub fn for_batch(urls: &[String], archive_filename: &str) -> Self {
        use sha2::{Digest, Sha256};

        let mut sorted: Vec<&str> = urls.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut hasher = Sha256::new();
        for url in sorted {
            hasher.update(url.as_bytes());
            hasher.update(b"\n");
        }

        Self {
            resource: format!("{:x}", hasher.finalize()),
            filename: archive_filename.to_string(),
        }
    }
}

impl std::fmt::Display for DownloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.resource, self.filename)
    }
}

/// Registry bookkeeping for one admitted operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadingEntry {
    /// Operation identity
    pub key: DownloadKey,
    /// When the operation was admitted
    pub started_at: DateTime<Utc>,
    /// Admission number, unique per registry
    pub ticket: u64,
}

/// One fetched and validated image
#[derive(Clone, Debug)]
pub struct ImageResource {
    /// URL the bytes came from
    pub source_url: String,
    /// Response body
    pub bytes: Bytes,
    /// Declared content type (always an `image/` type once validated)
    pub content_type: String,
}

/// Receipt returned by a [`PersistenceSink`](crate::sink::PersistenceSink)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadHandle {
    /// Sink-specific identifier of the save operation
    pub id: u64,
    /// Where the payload ended up, if the sink writes to the filesystem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Result of a successful single-image download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    /// Final (sanitized, extension-complete) filename handed to the sink
    pub filename: String,
    /// Sink receipt
    pub handle: DownloadHandle,
}

/// Result of a saved batch archive
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Archive filename handed to the sink
    pub filename: String,
    /// Number of images stored in the archive
    pub succeeded: usize,
    /// Number of images replaced by an error placeholder
    pub failed: usize,
    /// Sink receipt
    pub handle: DownloadHandle,
}

/// Event emitted during download processing
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An operation was admitted into the registry
    Started {
        /// Operation identity
        key: DownloadKey,
        /// Number of images the operation covers
        items: usize,
    },

    /// One image of a batch failed and was replaced by an error entry
    ItemFailed {
        /// Archive filename of the batch
        archive: String,
        /// 1-based position in the batch
        index: usize,
        /// Source URL
        url: String,
        /// Failure reason written to the archive
        reason: String,
    },

    /// A payload was handed to the sink
    Saved {
        /// Filename handed to the sink
        filename: String,
        /// Payload size in bytes
        size_bytes: u64,
    },

    /// An operation failed
    Failed {
        /// Operation identity
        key: DownloadKey,
        /// Error message
        error: String,
    },

    /// A duplicate request was rejected
    Rejected {
        /// Identity that is already in flight
        key: DownloadKey,
    },

    /// The staleness sweep evicted entries
    Swept {
        /// Number of evicted entries
        removed: usize,
    },

    /// Downloader is shutting down
    Shutdown,
}
