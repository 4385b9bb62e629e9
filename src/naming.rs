//! Deterministic destination naming for migrated assets.
//!
//! Every item's destination must be computable from its row identity and
//! canonical URL alone — before anything is downloaded — so that a re-run
//! can pre-check the destination and skip completed items without touching
//! the network. Two strategies cover the layouts the reconciliation step
//! expects:
//!
//! - **Identity**: `{id}.{ext}` — the destination mirrors database ids 1:1.
//! - **Origin**: the basename of the canonical URL's path (query stripped),
//!   so the original filenames survive for structural re-grouping. URLs
//!   without a usable basename fall back to identity naming.

use crate::classify::ImageKind;
use url::Url;

/// Where a migrated asset lands: a folder (from the table spec) plus a
/// filename derived from the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTarget {
    pub folder: String,
    pub filename: String,
}

impl PlacementTarget {
    /// The `folder/filename` key used for sink paths and public URLs.
    pub fn key(&self) -> String {
        format!("{}/{}", self.folder, self.filename)
    }
}

/// Filename derivation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStrategy {
    /// `{identity}.{ext}` — destination layout mirrors database ids.
    Identity,
    /// Basename of the canonical URL, falling back to identity naming.
    Origin,
}

/// Compute the destination for an item.
///
/// Pure and deterministic: the same inputs always produce the same target,
/// which is what makes repeated runs idempotent.
pub fn place(
    identity: u64,
    canonical_url: &str,
    kind: ImageKind,
    strategy: NamingStrategy,
    folder: &str,
) -> PlacementTarget {
    let filename = match strategy {
        NamingStrategy::Identity => identity_name(identity, kind),
        NamingStrategy::Origin => {
            url_basename(canonical_url).unwrap_or_else(|| identity_name(identity, kind))
        }
    };

    PlacementTarget {
        folder: folder.to_string(),
        filename,
    }
}

fn identity_name(identity: u64, kind: ImageKind) -> String {
    format!("{identity}.{}", kind.ext())
}

/// Last path segment of a URL, with query/fragment already stripped by the
/// parser. Returns `None` for unparseable URLs and empty basenames
/// (directory-style paths).
fn url_basename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let basename = parsed.path().rsplit('/').next()?;
    if basename.is_empty() {
        None
    } else {
        Some(basename.to_string())
    }
}
