//! # Pixhaul
//!
//! Migrates image assets referenced by database rows from an image-proxy CDN
//! to self-hosted object storage, normalizing resolution and format on the
//! way through. The database is never written: each run emits a mapping
//! document and a set of `UPDATE` statements, and the operator applies them
//! once the migrated assets are verified.
//!
//! # Architecture: One Pipeline, Many Policies
//!
//! Every item flows through the same stages:
//!
//! ```text
//! row (id, url) ─▶ resolve ─▶ place ─▶ exists? ──yes──▶ Skipped (recorded)
//!                                │
//!                                no
//!                                ▼
//!                  fetch canonical ──fail──▶ fetch proxy ──fail──▶ Failed
//!                                │                   │
//!                                ▼                   ▼
//!                            classify ─▶ transform ─▶ persist ─▶ Success
//! ```
//!
//! What used to be five near-identical scripts (download-only, migrate,
//! resize, reorganize, upload) is one driver parameterized by a
//! [`MigrationPolicy`](driver::MigrationPolicy): resolution bounds, crop
//! mode, naming strategy, URL pattern, and sink kind are the only things
//! that differ between variants.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolve`] | Extracts the canonical origin URL from a CDN proxy URL |
//! | [`classify`] | Infers an [`ImageKind`](classify::ImageKind) from URL and content-type |
//! | [`fetch`] | HTTP retrieval behind the [`Fetch`](fetch::Fetch) trait seam |
//! | [`imaging`] | Pure bytes-in/bytes-out resize, crop, sharpen, re-encode |
//! | [`naming`] | Deterministic destination naming (identity- or origin-keyed) |
//! | [`source`] | Row-iteration contract over the relational store |
//! | [`sink`] | Artifact persistence: local directory or S3-compatible store |
//! | [`driver`] | The per-item state machine, counters, and outcome log |
//! | [`report`] | Mapping JSON + rewrite SQL, regenerable byte-for-byte |
//! | [`thumbs`] | Parallel local square-thumbnail pass over migrated assets |
//! | [`config`] | Environment-variable connection settings, fail-fast |
//! | [`output`] | End-of-run console summary |
//!
//! # Design Decisions
//!
//! ## Idempotence Through Deterministic Placement
//!
//! The destination of an item is a pure function of its row identity and
//! canonical URL — never of anything downloaded. A re-run therefore
//! pre-checks each destination, skips completed items without a single
//! network request, and still regenerates the full reconciliation output.
//! Interrupting a run between items loses nothing.
//!
//! ## Soft Recovery, But Observable
//!
//! The pipeline prefers a degraded asset over a failed item: a malformed
//! embedded URL falls back to the proxy URL, and a transform error falls
//! back to the original bytes. Those recoveries are typed
//! ([`TransformNote`](imaging::TransformNote)) and logged rather than
//! swallowed, so a run's oddities are visible without failing it.
//!
//! ## The Driver Never Touches the Database
//!
//! Consistency between rows and storage is established by the generated
//! rewrite statements, applied explicitly by the operator after
//! verification. That keeps the pipeline free of cross-system transaction
//! concerns and makes a dry inspection of `mapping.json` possible before
//! anything changes.

pub mod classify;
pub mod config;
pub mod driver;
pub mod fetch;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod report;
pub mod resolve;
pub mod sink;
pub mod source;
pub mod thumbs;
