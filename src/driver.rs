//! The migration driver.
//!
//! Orchestrates, for every row of every requested table, the
//! resolve → fetch (with one fallback retry) → classify → transform →
//! place → persist pipeline, accumulating per-item outcomes and the
//! reconciliation records the [`report`](crate::report) module turns into
//! artifacts.
//!
//! Per-item state machine:
//!
//! ```text
//! Pending ─▶ Fetching ─▶ Fetched ─▶ Transforming ─▶ Persisted = Success
//!    │          │                                        │
//!    │          └──▶ FetchFailed ──▶ Failed              └──▶ Failed
//!    └──▶ Skipped (already migrated / empty URL)
//! ```
//!
//! Failure in one item never aborts the run: the item is logged, the
//! failure counter bumps, and the loop moves on. Items whose destination
//! already exists are skipped **before** any network traffic and still
//! contribute a mapping record, which is what makes repeated runs both
//! cheap and complete.
//!
//! The driver owns all cross-item state (counters, outcome log); everything
//! below it is a pure value flow, so interrupting between items loses at
//! most one partial write that the next run overwrites.

use crate::classify::{self, ImageKind};
use crate::fetch::{Fetch, FetchError, Fetched};
use crate::imaging::{TransformNote, TransformPolicy, transform};
use crate::naming::{NamingStrategy, PlacementTarget, place};
use crate::report::MappingRecord;
use crate::resolve::resolve;
use crate::sink::{ArtifactSink, SinkError};
use crate::source::{MigrationItem, RowSource, SourceError, TableSpec};
use log::{info, warn};
use std::fmt;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Policy knobs for one run. Every pipeline variant (download-only, full
/// migration, re-resize, restructure-upload) is a different value of this
/// struct, not a different program.
#[derive(Debug, Clone)]
pub struct MigrationPolicy {
    /// Resize/re-encode stage. `None` stores bytes exactly as fetched.
    pub transform: Option<TransformPolicy>,
    pub naming: NamingStrategy,
    /// Prefix of rewritten URLs: `{public_base}/{folder}/{filename}`.
    pub public_base: String,
    /// SQL LIKE pattern selecting which rows still point at the old CDN.
    pub url_pattern: String,
    /// Pause after each successful fetch, as rate-limit courtesy.
    pub throttle: Duration,
}

/// Why an item failed. Soft-recovered conditions (bad embedded URL,
/// transform errors) never end up here.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("fetch failed (canonical: {canonical}; fallback: {fallback})")]
    Fetch {
        canonical: FetchError,
        fallback: FetchError,
    },
    #[error("persist failed: {0}")]
    Persist(#[from] SinkError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyMigrated,
    EmptyUrl,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::AlreadyMigrated => "already-migrated",
            SkipReason::EmptyUrl => "empty-url",
        })
    }
}

/// Terminal state of one item.
#[derive(Debug)]
pub enum ItemOutcome {
    Success {
        target: PlacementTarget,
        bytes_written: u64,
    },
    Skipped {
        reason: SkipReason,
        /// The would-be destination; present for already-migrated items so
        /// the rewrite output stays complete across re-runs.
        target: Option<PlacementTarget>,
    },
    Failed(ItemError),
}

/// Accumulated result of migrating one table.
#[derive(Debug)]
pub struct TableReport {
    pub spec: TableSpec,
    /// Success and skipped counts combined — an already-present asset is a
    /// migrated asset.
    pub succeeded: u64,
    pub failed: u64,
    /// Ordered per-item outcome log, as the rows were iterated.
    pub items: Vec<(u64, ItemOutcome)>,
    pub records: Vec<MappingRecord>,
}

impl TableReport {
    pub fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            succeeded: 0,
            failed: 0,
            items: Vec::new(),
            records: Vec::new(),
        }
    }
}

/// The pipeline, generic over its three I/O seams.
pub struct Migrator<S, F, K> {
    source: S,
    fetcher: F,
    sink: K,
    policy: MigrationPolicy,
}

impl<S: RowSource, F: Fetch, K: ArtifactSink> Migrator<S, F, K> {
    pub fn new(source: S, fetcher: F, sink: K, policy: MigrationPolicy) -> Self {
        Self {
            source,
            fetcher,
            sink,
            policy,
        }
    }

    /// Migrate every table in order, one report per table.
    pub fn run(&mut self, specs: &[TableSpec]) -> Result<Vec<TableReport>, SourceError> {
        specs.iter().map(|spec| self.run_table(spec)).collect()
    }

    /// Migrate one table. Only row-source errors abort; per-item failures
    /// are recorded and skipped over.
    pub fn run_table(&mut self, spec: &TableSpec) -> Result<TableReport, SourceError> {
        let items = self.source.rows(spec, &self.policy.url_pattern)?;
        info!("{}: {} rows to migrate", spec.table, items.len());

        let mut report = TableReport::new(spec.clone());
        let total = items.len();

        for (i, item) in items.iter().enumerate() {
            info!("[{}/{}] id={}", i + 1, total, item.identity);
            let outcome = self.process_item(spec, item);

            match &outcome {
                ItemOutcome::Success {
                    target,
                    bytes_written,
                } => {
                    info!("  saved {} ({:.1} KiB)", target.key(), *bytes_written as f64 / 1024.0);
                    report.succeeded += 1;
                    report.records.push(self.record_for(item, target));
                }
                ItemOutcome::Skipped { reason, target } => {
                    info!("  skipped: {reason}");
                    report.succeeded += 1;
                    if let Some(target) = target {
                        report.records.push(self.record_for(item, target));
                    }
                }
                ItemOutcome::Failed(err) => {
                    warn!("  id={} failed: {err}", item.identity);
                    report.failed += 1;
                }
            }

            report.items.push((item.identity, outcome));
        }

        info!(
            "{} done: {} succeeded, {} failed",
            spec.table, report.succeeded, report.failed
        );
        Ok(report)
    }

    fn process_item(&self, spec: &TableSpec, item: &MigrationItem) -> ItemOutcome {
        if item.source_url.is_empty() {
            return ItemOutcome::Skipped {
                reason: SkipReason::EmptyUrl,
                target: None,
            };
        }

        let resolved = resolve(&item.source_url);

        // URL-only classification: the destination must be computable
        // without a network round trip, or re-runs couldn't skip for free.
        let url_kind = classify::classify(&resolved.canonical, None);
        let target = place(
            item.identity,
            &resolved.canonical,
            url_kind,
            self.policy.naming,
            &spec.folder,
        );

        match self.sink.exists(&target) {
            Ok(true) => {
                return ItemOutcome::Skipped {
                    reason: SkipReason::AlreadyMigrated,
                    target: Some(target),
                };
            }
            Ok(false) => {}
            Err(e) => return ItemOutcome::Failed(ItemError::Persist(e)),
        }

        let fetched = match self.fetch_with_fallback(item.identity, &resolved.canonical, &resolved.fallback) {
            Ok(f) => f,
            Err(e) => return ItemOutcome::Failed(e),
        };

        if !self.policy.throttle.is_zero() {
            thread::sleep(self.policy.throttle);
        }

        // The response header may refine the encoding target; the filename
        // keeps its URL-derived extension so the placement stays stable.
        let kind = classify::classify(&resolved.canonical, fetched.content_type.as_deref());
        let bytes = self.transform_stage(item.identity, fetched, kind);

        match self.sink.write(&target, &bytes, kind.mime()) {
            Ok(bytes_written) => ItemOutcome::Success {
                target,
                bytes_written,
            },
            Err(e) => ItemOutcome::Failed(ItemError::Persist(e)),
        }
    }

    /// One attempt against the canonical URL, then exactly one against the
    /// fallback (the unmodified proxy URL).
    fn fetch_with_fallback(
        &self,
        identity: u64,
        canonical: &str,
        fallback: &str,
    ) -> Result<Fetched, ItemError> {
        let canonical_err = match self.fetcher.fetch(canonical) {
            Ok(f) => return Ok(f),
            Err(e) => e,
        };

        warn!("  id={identity}: canonical fetch failed ({canonical_err}), retrying proxy URL");
        self.fetcher.fetch(fallback).map_err(|fallback_err| ItemError::Fetch {
            canonical: canonical_err,
            fallback: fallback_err,
        })
    }

    fn transform_stage(&self, identity: u64, fetched: Fetched, kind: ImageKind) -> Vec<u8> {
        let Some(policy) = &self.policy.transform else {
            return fetched.bytes;
        };

        let result = transform(&fetched.bytes, kind, policy);
        match &result.note {
            TransformNote::Resized { from, to } => {
                info!(
                    "  id={identity}: resized {}x{} -> {}x{}",
                    from.0, from.1, to.0, to.1
                );
            }
            TransformNote::Recovered(e) => {
                warn!("  id={identity}: transform recovered, keeping original bytes ({e})");
            }
            TransformNote::WithinBounds | TransformNote::FormatPassthrough => {}
        }
        result.bytes
    }

    fn record_for(&self, item: &MigrationItem, target: &PlacementTarget) -> MappingRecord {
        MappingRecord {
            id: item.identity,
            old_url: item.source_url.clone(),
            new_url: format!(
                "{}/{}",
                self.policy.public_base.trim_end_matches('/'),
                target.key()
            ),
            filename: target.filename.clone(),
        }
    }
}
