//! Single image download.

use crate::error::{Error, Result};
use crate::registry::RegistryGuard;
use crate::sanitize::{ensure_extension, sanitize_filename};
use crate::types::{DownloadKey, Event, SavedFile};

use super::ImageDownloader;

impl ImageDownloader {
    /// Download one image and save it under `filename`
    ///
    /// The request is keyed by `(url, filename)`; a second request with the
    /// same key is rejected with [`Error::AlreadyInProgress`] until the first
    /// one finishes. The saved filename is sanitized and gets an extension
    /// from the response content type when it has none.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyInProgress`] for a duplicate in-flight request
    /// - [`Error::Network`], [`Error::HttpStatus`] or [`Error::InvalidContentType`]
    ///   when the image cannot be fetched
    /// - [`Error::PersistenceFailed`] when the sink rejects the payload
    pub async fn download_image(&self, url: &str, filename: &str) -> Result<SavedFile> {
        let key = DownloadKey::new(url, filename);
        let guard = self.admit(key.clone(), 1)?;

        tracing::info!(url, filename, "Downloading image");
        let result = self.fetch_and_save(url, filename).await;
        drop(guard);

        if let Err(ref e) = result {
            tracing::warn!(url, filename, error = %e, "Image download failed");
            self.emit_event(Event::Failed {
                key,
                error: e.to_string(),
            });
        }

        result
    }

    async fn fetch_and_save(&self, url: &str, filename: &str) -> Result<SavedFile> {
        let image = self.fetcher.fetch(url).await?;
        let filename = ensure_extension(&sanitize_filename(filename), &image.content_type);
        let handle = self.persist(image.bytes, &filename).await?;
        Ok(SavedFile { filename, handle })
    }

    /// Admit `key` into the registry or reject it as a duplicate
    pub(crate) fn admit(&self, key: DownloadKey, items: usize) -> Result<RegistryGuard> {
        match self.registry.try_begin(key.clone()) {
            Some(guard) => {
                self.emit_event(Event::Started { key, items });
                Ok(guard)
            }
            None => {
                tracing::warn!(
                    resource = %key.resource,
                    filename = %key.filename,
                    "Download already in progress, rejecting duplicate"
                );
                self.emit_event(Event::Rejected { key: key.clone() });
                Err(Error::AlreadyInProgress {
                    resource: key.resource,
                    filename: key.filename,
                })
            }
        }
    }
}
