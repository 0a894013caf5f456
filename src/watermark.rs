//! Watermark removal for carousel image URLs.
//!
//! Carousel pages serve watermarked renditions whose path carries an
//! image-processing suffix after `!`, e.g.
//! `https://sns-webpic.example/202401/abcd/1040g0k0xyz!nd_dft_wlteh_webp_3`.
//! Dropping the suffix and the two leading path segments yields the
//! identifier of the clean original on the image CDN.

/// Minimum number of path segments needed to rebuild a clean URL
const MIN_SEGMENTS: usize = 3;

/// Map a watermarked image URL to its clean CDN URL.
///
/// Returns the input unchanged when it does not parse, carries no `!`
/// suffix, or has too few path segments.
///
/// # Examples
///
/// ```
/// use carousel_dl::watermark::strip_watermark;
///
/// let clean = strip_watermark(
///     "https://sns-webpic.example/202401/abcd/1040g0k0xyz!nd_dft_wlteh_webp_3",
///     "https://sns-img-bd.xhscdn.com",
/// );
/// assert_eq!(clean, "https://sns-img-bd.xhscdn.com/1040g0k0xyz");
/// ```
pub fn strip_watermark(url: &str, cdn_base: &str) -> String {
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(url, error = %e, "Not stripping watermark from unparseable URL");
            return url.to_string();
        }
    };

    let Some((kept, _suffix)) = parsed.path().split_once('!') else {
        return url.to_string();
    };

    // Leading "/" yields an empty first part
    let parts: Vec<&str> = kept.split('/').collect();
    if parts.len() <= MIN_SEGMENTS {
        return url.to_string();
    }

    format!(
        "{}/{}",
        cdn_base.trim_end_matches('/'),
        parts[MIN_SEGMENTS..].join("/")
    )
}
