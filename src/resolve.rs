//! Canonical-URL extraction from CDN proxy URLs.
//!
//! The database stores image URLs pointing at the CDN's image-proxy service,
//! which embeds the true origin URL as a percent-encoded `src=` parameter:
//!
//! ```text
//! https://cdn.example.net/image/w80_blur/src=https%3A%2F%2Forigin.example.com%2Fimg.png
//! ```
//!
//! Resolution is a pure string operation and never fails: a URL without the
//! marker, or one whose embedded portion does not decode, resolves to itself.
//! The proxy URL is always kept as the fallback so the driver can retry the
//! download against it when the origin no longer serves the file.

use percent_encoding::percent_decode_str;

/// Marker introducing the embedded origin URL in a proxy URL.
const EMBED_MARKER: &str = "src=";

/// A source URL resolved into its canonical and fallback forms.
///
/// `fallback` is always the unmodified input. `canonical` equals `fallback`
/// when no embedding marker is present or the embedded portion is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub canonical: String,
    pub fallback: String,
}

/// Resolve a proxy URL into `(canonical, fallback)`.
///
/// Everything after the first `src=` is percent-decoded and taken as the
/// canonical URL. Decoding failures fall back to the input unchanged.
pub fn resolve(proxy_url: &str) -> ResolvedSource {
    let fallback = proxy_url.to_string();

    let Some(pos) = proxy_url.find(EMBED_MARKER) else {
        return ResolvedSource {
            canonical: fallback.clone(),
            fallback,
        };
    };

    let embedded = &proxy_url[pos + EMBED_MARKER.len()..];
    let canonical = match percent_decode_str(embedded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        // Malformed encoding: keep the proxy URL rather than surface an error
        Err(_) => fallback.clone(),
    };

    ResolvedSource {
        canonical,
        fallback,
    }
}
