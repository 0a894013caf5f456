//! Download intents and the rules for building them from a scraped carousel.

use crate::config::NamingConfig;
use crate::sanitize::post_title;
use crate::utils::image_extension_from_url;
use crate::watermark::strip_watermark;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Image format requested by the caller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    /// Keep whatever the server sends (default)
    #[default]
    Original,
    /// PNG
    Png,
    /// JPEG
    Jpg,
    /// WebP
    Webp,
}

impl DownloadFormat {
    /// Extension implied by the format, `None` for [`DownloadFormat::Original`]
    pub fn extension(self) -> Option<&'static str> {
        match self {
            DownloadFormat::Original => None,
            DownloadFormat::Png => Some("png"),
            DownloadFormat::Jpg => Some("jpg"),
            DownloadFormat::Webp => Some("webp"),
        }
    }
}

/// A request to download one image or a set of images
///
/// Serialized with an `action` tag so it matches the messages an extension
/// content script sends: `downloadImage` / `downloadImages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Intent {
    /// Save one image under a filename
    #[serde(rename = "downloadImage")]
    DownloadOne {
        /// Image URL
        #[serde(alias = "resourceUrl")]
        url: String,
        /// Requested filename (sanitized before saving)
        filename: String,
        /// Requested format; carried along, not converted
        #[serde(default)]
        format: DownloadFormat,
    },

    /// Bundle several images into one archive
    #[serde(rename = "downloadImages")]
    DownloadMany {
        /// Image URLs in carousel order
        #[serde(rename = "images", alias = "resourceUrls")]
        urls: Vec<String>,
        /// Archive label (sanitized before use)
        #[serde(rename = "postTitle", alias = "label")]
        label: String,
        /// Requested format; carried along, not converted
        #[serde(default)]
        format: DownloadFormat,
    },
}

impl Intent {
    /// Build the intent for a scraped carousel.
    ///
    /// Watermarks are stripped, duplicates dropped (first occurrence wins)
    /// and the raw title turned into a post label. One image becomes a
    /// [`Intent::DownloadOne`] named `<title>.<ext>`, several become a
    /// [`Intent::DownloadMany`]. Returns `None` when there is nothing to download.
    pub fn for_carousel<I, S>(
        images: I,
        raw_title: &str,
        format: DownloadFormat,
        naming: &NamingConfig,
    ) -> Option<Intent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut urls: Vec<String> = images
            .into_iter()
            .map(|url| strip_watermark(url.as_ref(), &naming.cdn_base))
            .filter(|url| seen.insert(url.clone()))
            .collect();

        let title = post_title(
            raw_title,
            naming.max_title_chars,
            &naming.fallback_post_title,
        );

        match urls.len() {
            0 => None,
            1 => {
                let url = urls.remove(0);
                Some(Intent::DownloadOne {
                    filename: single_image_filename(&title, &url, format),
                    url,
                    format,
                })
            }
            _ => Some(Intent::DownloadMany {
                urls,
                label: title,
                format,
            }),
        }
    }

    /// Number of images the intent covers
    pub fn len(&self) -> usize {
        match self {
            Intent::DownloadOne { .. } => 1,
            Intent::DownloadMany { urls, .. } => urls.len(),
        }
    }

    /// True for a batch with no URLs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Filename for a single image: `<title>.<ext>`
///
/// The extension comes from the URL path for [`DownloadFormat::Original`]
/// and from the format otherwise.
pub fn single_image_filename(title: &str, url: &str, format: DownloadFormat) -> String {
    let ext = match format.extension() {
        Some(ext) => ext.to_string(),
        None => image_extension_from_url(url),
    };
    format!("{title}.{ext}")
}
