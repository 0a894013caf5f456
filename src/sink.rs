//! Persistence sink boundary.
//!
//! The downloader never writes files itself; finished payloads are handed to a
//! [`PersistenceSink`]. [`DirectorySink`] is the bundled implementation that
//! saves into a local directory.

use crate::config::{FileCollisionAction, OutputConfig};
use crate::error::{Error, Result};
use crate::types::DownloadHandle;
use crate::utils::{MAX_RENAME_ATTEMPTS, numbered_path};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

/// Trait for saving finished payloads
///
/// Implementations must map every failure to [`Error::PersistenceFailed`]
/// so callers can report it without knowing the storage backend.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Save `payload` under `filename` and return a receipt
    async fn persist(&self, payload: Bytes, filename: &str) -> Result<DownloadHandle>;

    /// Name of the sink for logging
    fn name(&self) -> &'static str;
}

/// Sink that writes payloads into a directory
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    collision: FileCollisionAction,
    next_id: AtomicU64,
}

impl DirectorySink {
    /// Create a sink writing into `dir`
    pub fn new(dir: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            dir: dir.into(),
            collision,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a sink from the output section of the configuration
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.download_dir.clone(), config.file_collision)
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the file that will hold the payload
    ///
    /// Names are claimed with `create_new`, so two overlapping saves can never
    /// end up writing the same file unless the collision action is overwrite.
    async fn claim(&self, target: &Path) -> Result<(tokio::fs::File, PathBuf)> {
        if self.collision == FileCollisionAction::Overwrite {
            let file = tokio::fs::File::create(target).await.map_err(|e| {
                Error::PersistenceFailed(format!("failed to create '{}': {}", target.display(), e))
            })?;
            return Ok((file, target.to_path_buf()));
        }

        for attempt in 0..=MAX_RENAME_ATTEMPTS {
            let candidate = numbered_path(target, attempt)?;
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;

            match opened {
                Ok(file) => return Ok((file, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.collision == FileCollisionAction::Skip {
                        return Err(Error::PersistenceFailed(format!(
                            "{} already exists and collision action is skip",
                            candidate.display()
                        )));
                    }
                }
                Err(e) => {
                    return Err(Error::PersistenceFailed(format!(
                        "failed to create '{}': {}",
                        candidate.display(),
                        e
                    )));
                }
            }
        }

        Err(Error::PersistenceFailed(format!(
            "could not find a unique filename for {} after {} attempts",
            target.display(),
            MAX_RENAME_ATTEMPTS
        )))
    }
}

#[async_trait]
impl PersistenceSink for DirectorySink {
    async fn persist(&self, payload: Bytes, filename: &str) -> Result<DownloadHandle> {
        // Filenames arrive sanitized, but never let one escape the directory
        let name = Path::new(filename)
            .file_name()
            .filter(|name| *name == std::ffi::OsStr::new(filename))
            .ok_or_else(|| {
                Error::PersistenceFailed(format!("refusing to write outside target dir: {filename}"))
            })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::PersistenceFailed(format!(
                "failed to create directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let (mut file, path) = self.claim(&self.dir.join(name)).await?;

        let written = async {
            file.write_all(&payload).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            // Leave no truncated file behind under a name we claimed
            tokio::fs::remove_file(&path).await.ok();
            return Err(Error::PersistenceFailed(format!(
                "failed to write '{}': {}",
                path.display(),
                e
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            sink = self.name(),
            id,
            path = %path.display(),
            size_bytes = payload.len(),
            "Payload written"
        );

        Ok(DownloadHandle {
            id,
            path: Some(path),
        })
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
