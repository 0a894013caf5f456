//! Multi-image archive download.

use crate::archive::{BatchJob, ItemResult};
use crate::error::Result;
use crate::types::{BatchReport, DownloadKey, Event};
use bytes::Bytes;

use super::ImageDownloader;

impl ImageDownloader {
    /// Download every URL and save them as one ZIP archive
    ///
    /// Images are fetched one after another in input order. A failed image
    /// does not abort the batch: it is replaced by a `<label>-<i>-ERROR.txt`
    /// entry, so an archive is saved even when every image fails. The archive
    /// also carries a `<label>-image-links.txt` manifest of all URLs.
    ///
    /// The batch is keyed by its URL set and archive name: the same URLs in
    /// any order count as the same request.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyInProgress`](crate::Error::AlreadyInProgress) for a duplicate in-flight batch
    /// - [`Error::Archive`](crate::Error::Archive) if the ZIP cannot be written
    /// - [`Error::PersistenceFailed`](crate::Error::PersistenceFailed) when the sink rejects the archive
    pub async fn download_images(&self, urls: &[String], label: &str) -> Result<BatchReport> {
        let job = BatchJob::new(label, urls.to_vec());
        let key = DownloadKey::for_batch(urls, &job.archive_filename());
        let guard = self.admit(key.clone(), urls.len())?;

        tracing::info!(
            label = job.label(),
            items = urls.len(),
            "Downloading image batch"
        );
        let result = self.build_and_save(job).await;
        drop(guard);

        match result {
            Ok(ref report) => {
                tracing::info!(
                    filename = %report.filename,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "Image batch saved"
                );
            }
            Err(ref e) => {
                tracing::warn!(label, error = %e, "Image batch failed");
                self.emit_event(Event::Failed {
                    key,
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn build_and_save(&self, mut job: BatchJob) -> Result<BatchReport> {
        let filename = job.archive_filename();

        while let Some((index, url)) = job.next_item().map(|(i, url)| (i, url.to_string())) {
            let fetched = self.fetcher.fetch(&url).await;
            let outcome = job.record(fetched);

            if let ItemResult::Failure { ref reason } = outcome.result {
                tracing::warn!(url = %url, index, reason = %reason, "Batch item failed");
                let event = Event::ItemFailed {
                    archive: filename.clone(),
                    index,
                    url,
                    reason: reason.clone(),
                };
                self.emit_event(event);
            }
        }

        let succeeded = job.outcomes().iter().filter(|o| o.is_success()).count();
        let failed = job.items().len() - succeeded;

        let payload = job
            .into_archive()
            .to_zip(self.config.archive.compression)?;
        let handle = self.persist(Bytes::from(payload), &filename).await?;

        Ok(BatchReport {
            filename,
            succeeded,
            failed,
            handle,
        })
    }
}
