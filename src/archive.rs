//! Batch archive assembly.
//!
//! A [`BatchJob`] accumulates one outcome per source URL, in input order, and
//! folds into an [`Archive`]: one image entry per success, one
//! `-ERROR.txt` placeholder per failure and a manifest listing every URL.
//! Nothing here performs I/O; serialization to ZIP happens in memory.

use crate::config::ArchiveCompression;
use crate::error::{Error, Result};
use crate::sanitize::{extension_for_content_type, sanitize_label};
use crate::types::ImageResource;
use bytes::Bytes;
use std::io::Write;

/// Outcome of one batch item
#[derive(Clone, Debug)]
pub enum ItemResult {
    /// Image fetched and validated
    Success {
        /// Image bytes
        bytes: Bytes,
        /// Entry name inside the archive (`<label>-<index>.<ext>`)
        name: String,
    },
    /// Fetch or validation failed
    Failure {
        /// Human-readable reason written into the error placeholder
        reason: String,
    },
}

/// Outcome of one batch item together with its position
#[derive(Clone, Debug)]
pub struct ItemOutcome {
    /// 1-based position in the input
    pub index: usize,
    /// What happened
    pub result: ItemResult,
}

impl ItemOutcome {
    /// True for a stored image
    pub fn is_success(&self) -> bool {
        matches!(self.result, ItemResult::Success { .. })
    }
}

/// Reason recorded for items the caller never got to
const NOT_FETCHED: &str = "image was not fetched";

/// One batch request, built incrementally and consumed once
#[derive(Clone, Debug)]
pub struct BatchJob {
    label: String,
    items: Vec<String>,
    outcomes: Vec<ItemOutcome>,
}

impl BatchJob {
    /// Start a job for `items` under `label` (sanitized here)
    pub fn new(label: &str, items: Vec<String>) -> Self {
        let outcomes = Vec::with_capacity(items.len());
        Self {
            label: sanitize_label(label),
            items,
            outcomes,
        }
    }

    /// Sanitized label used as the prefix of every entry
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Source URLs in input order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Outcomes recorded so far
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    /// Filename the finished archive is saved under
    pub fn archive_filename(&self) -> String {
        archive_filename(&self.label)
    }

    /// Name of the manifest entry
    pub fn manifest_name(&self) -> String {
        format!("{}-image-links.txt", self.label)
    }

    /// URL of the next item that has no outcome yet
    pub fn next_item(&self) -> Option<(usize, &str)> {
        let position = self.outcomes.len();
        self.items
            .get(position)
            .map(|url| (position + 1, url.as_str()))
    }

    /// Record the outcome of the next item.
    ///
    /// Outcomes are positional: the n-th call describes the n-th URL.
    /// Returns the recorded outcome.
    pub fn record(&mut self, fetched: Result<ImageResource>) -> &ItemOutcome {
        let index = self.outcomes.len() + 1;
        let result = match fetched {
            Ok(image) => ItemResult::Success {
                name: format!(
                    "{}-{}.{}",
                    self.label,
                    index,
                    extension_for_content_type(&image.content_type)
                ),
                bytes: image.bytes,
            },
            Err(e) => ItemResult::Failure {
                reason: failure_reason(&e),
            },
        };
        self.outcomes.push(ItemOutcome { index, result });
        &self.outcomes[index - 1]
    }

    /// Fold the job into an archive.
    ///
    /// Items without a recorded outcome get an error placeholder, so the
    /// archive always holds `items + 1` entries.
    pub fn into_archive(self) -> Archive {
        let manifest_name = self.manifest_name();
        let mut entries = Vec::with_capacity(self.items.len() + 1);
        let mut outcomes = self.outcomes.into_iter();

        for index in 1..=self.items.len() {
            let result = outcomes
                .next()
                .map(|outcome| outcome.result)
                .unwrap_or_else(|| ItemResult::Failure {
                    reason: NOT_FETCHED.to_string(),
                });

            entries.push(match result {
                ItemResult::Success { bytes, name } => ArchiveEntry {
                    name,
                    contents: bytes,
                },
                ItemResult::Failure { reason } => ArchiveEntry {
                    name: format!("{}-{}-ERROR.txt", self.label, index),
                    contents: Bytes::from(format!("Download failed: {reason}")),
                },
            });
        }

        let manifest = self
            .items
            .iter()
            .enumerate()
            .map(|(i, url)| format!("{}. {}", i + 1, url))
            .collect::<Vec<_>>()
            .join("\n");
        entries.push(ArchiveEntry {
            name: manifest_name,
            contents: Bytes::from(manifest),
        });

        Archive { entries }
    }
}

/// Archive filename for a sanitized label
pub(crate) fn archive_filename(label: &str) -> String {
    format!("{label}-images.zip")
}

fn failure_reason(error: &Error) -> String {
    match error {
        // Strip the "network error: " prefix, the reason is read by a person
        Error::Network(e) => e.to_string(),
        other => other.to_string(),
    }
}

/// One file inside an archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name
    pub name: String,
    /// Entry contents (UTF-8 for text entries)
    pub contents: Bytes,
}

/// Ordered set of archive entries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Entries in archive order (items by index, manifest last)
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look an entry up by name
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Serialize to ZIP bytes.
    ///
    /// Timestamps are pinned to the ZIP epoch so identical archives produce
    /// identical bytes.
    pub fn to_zip(&self, compression: ArchiveCompression) -> Result<Vec<u8>> {
        let method = match compression {
            ArchiveCompression::Stored => zip::CompressionMethod::Stored,
            ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
        };
        let options = zip::write::FileOptions::default()
            .compression_method(method)
            .last_modified_time(zip::DateTime::default());

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.contents)?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
