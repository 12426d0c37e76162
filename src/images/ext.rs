//! File extension inference for downloaded images.
//!
//! Lookups run in a fixed order: the response content type, then the URL
//! path suffix, then the leading magic bytes. Anything still unknown gets
//! [`DEFAULT_EXTENSION`].

use imagesize::ImageType;

/// Extension used when nothing else identifies the image.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Known MIME types, matched on the essence (parameters stripped).
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/pjpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/svg+xml", "svg"),
    ("image/bmp", "bmp"),
];

/// Known URL path suffixes, matched case-insensitively.
const SUFFIXES: &[(&str, &str)] = &[
    ("png", "png"),
    ("jpg", "jpg"),
    ("jpeg", "jpg"),
    ("gif", "gif"),
    ("webp", "webp"),
    ("avif", "avif"),
    ("svg", "svg"),
    ("bmp", "bmp"),
];

/// Picks the extension for an image fetched from `url`.
pub fn infer_extension(content_type: Option<&str>, url: &str, bytes: &[u8]) -> &'static str {
    content_type
        .and_then(from_content_type)
        .or_else(|| from_url(url))
        .or_else(|| from_magic(bytes))
        .unwrap_or(DEFAULT_EXTENSION)
}

pub fn from_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    lookup(CONTENT_TYPES, &essence)
}

pub fn from_url(url: &str) -> Option<&'static str> {
    let parsed = url::Url::parse(url).ok()?;
    let file = parsed.path_segments()?.next_back()?;
    let (_, suffix) = file.rsplit_once('.')?;
    lookup(SUFFIXES, &suffix.to_ascii_lowercase())
}

fn from_magic(bytes: &[u8]) -> Option<&'static str> {
    match imagesize::image_type(bytes).ok()? {
        ImageType::Png => Some("png"),
        ImageType::Jpeg => Some("jpg"),
        ImageType::Gif => Some("gif"),
        ImageType::Webp => Some("webp"),
        ImageType::Bmp => Some("bmp"),
        _ => None,
    }
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, ext)| *ext)
}
