//! Image format inference from URLs and transport hints.
//!
//! The database URLs rarely carry a trustworthy extension (the proxy service
//! hides it behind transform parameters), so the format is inferred rather
//! than taken from caller metadata. A `Content-Type` response header, when
//! available, wins over the URL; the URL check is a case-insensitive
//! substring match in fixed priority order. Everything unrecognized is jpg.
//!
//! Downstream encoding and file-extension selection both depend on this
//! ordering, so it must not change.

/// The image formats the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    /// File extension, without the dot.
    pub fn ext(self) -> &'static str {
        match self {
            ImageKind::Jpg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    /// MIME type used when uploading.
    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
        }
    }

    /// Whether the transformer may decode and re-encode this format.
    /// Gif is excluded to preserve animation.
    pub fn re_encodable(self) -> bool {
        !matches!(self, ImageKind::Gif)
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ext())
    }
}

/// Infer an image format from a URL and an optional content-type hint.
///
/// The hint takes priority when it names png/gif/webp. Otherwise the
/// lowercased URL is checked for `.png`, `.gif`, `.webp` in that order.
/// No match means jpg.
pub fn classify(url: &str, content_type: Option<&str>) -> ImageKind {
    if let Some(ct) = content_type {
        if ct.contains("png") {
            return ImageKind::Png;
        } else if ct.contains("gif") {
            return ImageKind::Gif;
        } else if ct.contains("webp") {
            return ImageKind::Webp;
        }
    }

    let lower = url.to_lowercase();
    if lower.contains(".png") {
        ImageKind::Png
    } else if lower.contains(".gif") {
        ImageKind::Gif
    } else if lower.contains(".webp") {
        ImageKind::Webp
    } else {
        ImageKind::Jpg
    }
}
