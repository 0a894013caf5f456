//! Filename sanitization and extension helpers.
//!
//! Browser download targets reject `\ / : * ? " < > |`, so every filename and
//! archive label goes through [`sanitize_filename`] before it reaches a sink.

/// Characters the browser download API refuses in a filename
pub const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Returned when nothing usable is left after sanitizing
pub const FALLBACK_FILENAME: &str = "xhs-image";

/// Extension used when a content type has no usable subtype
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Sanitize an arbitrary string into a download-safe filename.
///
/// - Replaces each of `\ / : * ? " < > |` with `_`
/// - Collapses runs of `_` into one
/// - Trims whitespace and `_` from both ends
/// - Falls back to [`FALLBACK_FILENAME`] when the result is empty
///
/// The function is total and idempotent.
///
/// # Examples
///
/// ```
/// use carousel_dl::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c.png"), "a_b_c.png");
/// assert_eq!(sanitize_filename("??"), "xhs-image");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    clean(name, |c| FORBIDDEN_CHARS.contains(&c))
}

/// Sanitize a post label for use as an archive and entry-name prefix.
///
/// Stricter than [`sanitize_filename`]: whitespace and ASCII punctuation other
/// than `-`, `_` and `.` are replaced as well, so `"My Post!"` becomes
/// `"My_Post"`. Non-ASCII letters are kept.
pub fn sanitize_label(label: &str) -> String {
    clean(label, |c| {
        FORBIDDEN_CHARS.contains(&c)
            || c.is_whitespace()
            || (c.is_ascii_punctuation() && !matches!(c, '-' | '_' | '.'))
    })
}

fn clean(input: &str, replace: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_underscore = false;

    for c in input.chars() {
        let c = if replace(c) { '_' } else { c };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c == '_' || c.is_whitespace());
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// True iff `name` ends with `.` followed by one or more ASCII alphanumerics.
pub fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Derive a file extension from a declared content type.
///
/// Parameters are dropped and structured-syntax suffixes (`+xml`) removed;
/// anything that does not leave a plain alphanumeric subtype maps to
/// [`DEFAULT_EXTENSION`].
///
/// ```
/// use carousel_dl::sanitize::extension_for_content_type;
///
/// assert_eq!(extension_for_content_type("image/png"), "png");
/// assert_eq!(extension_for_content_type("image/svg+xml"), "svg");
/// assert_eq!(extension_for_content_type("image/"), "jpg");
/// ```
pub fn extension_for_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let subtype = essence
        .split_once('/')
        .map(|(_, sub)| sub.split('+').next().unwrap_or_default())
        .unwrap_or_default();

    if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        subtype.to_string()
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// Append the content type's extension unless `name` already has one.
pub fn ensure_extension(name: &str, content_type: &str) -> String {
    if has_extension(name) {
        name.to_string()
    } else {
        format!("{}.{}", name, extension_for_content_type(content_type))
    }
}

/// True iff the declared content type is an image media type
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Derive a post label from scraped title text.
///
/// Replaces forbidden characters, collapses `_` runs, keeps at most
/// `max_chars` characters and trims whitespace. Returns `fallback` when
/// nothing is left.
pub fn post_title(raw: &str, max_chars: usize, fallback: &str) -> String {
    let mut replaced = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for c in raw.trim().chars() {
        let c = if FORBIDDEN_CHARS.contains(&c) { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        replaced.push(c);
    }

    let truncated: String = replaced.chars().take(max_chars).collect();
    let title = truncated.trim();
    if title.is_empty() {
        fallback.to_string()
    } else {
        title.to_string()
    }
}
