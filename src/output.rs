//! CLI output formatting for the end of a run.
//!
//! Each stage of output has a `format_*` function (returns `Vec<String>`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! ```text
//! room
//!     118 migrated (111 fetched, 7 already present)
//!     2 failed
//!         id=17: fetch failed (canonical: unexpected status 404; fallback: request timed out)
//! accommodation_image
//!     96 migrated (96 fetched, 0 already present)
//!
//! Total: 214 migrated, 2 failed
//! ```

use crate::driver::{ItemOutcome, SkipReason, TableReport};
use std::path::Path;

/// Format the per-table summary plus run totals.
pub fn format_run_summary(reports: &[TableReport]) -> Vec<String> {
    let mut lines = Vec::new();

    for report in reports {
        let already_present = report
            .items
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    ItemOutcome::Skipped {
                        reason: SkipReason::AlreadyMigrated,
                        ..
                    }
                )
            })
            .count() as u64;
        let fetched = report.succeeded - already_present;

        lines.push(report.spec.table.clone());
        lines.push(format!(
            "    {} migrated ({} fetched, {} already present)",
            report.succeeded, fetched, already_present
        ));

        if report.failed > 0 {
            lines.push(format!("    {} failed", report.failed));
            for (identity, outcome) in &report.items {
                if let ItemOutcome::Failed(err) = outcome {
                    lines.push(format!("        id={identity}: {err}"));
                }
            }
        }
    }

    let total_succeeded: u64 = reports.iter().map(|r| r.succeeded).sum();
    let total_failed: u64 = reports.iter().map(|r| r.failed).sum();
    lines.push(String::new());
    lines.push(format!("Total: {total_succeeded} migrated, {total_failed} failed"));

    lines
}

/// Print the run summary and artifact locations.
pub fn print_run_summary(reports: &[TableReport], mapping_path: &Path, sql_path: &Path) {
    for line in format_run_summary(reports) {
        println!("{line}");
    }
    println!("Mapping: {}", mapping_path.display());
    println!("Rewrites: {}", sql_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ItemError, SkipReason};
    use crate::fetch::FetchError;
    use crate::naming::PlacementTarget;
    use crate::source::TableSpec;

    fn target() -> PlacementTarget {
        PlacementTarget {
            folder: "room".to_string(),
            filename: "1.jpg".to_string(),
        }
    }

    fn report() -> TableReport {
        let mut r = TableReport::new(
            "room:room_id:main_image_url:room".parse::<TableSpec>().unwrap(),
        );
        r.succeeded = 2;
        r.failed = 1;
        r.items = vec![
            (
                1,
                ItemOutcome::Success {
                    target: target(),
                    bytes_written: 1024,
                },
            ),
            (
                2,
                ItemOutcome::Skipped {
                    reason: SkipReason::AlreadyMigrated,
                    target: Some(target()),
                },
            ),
            (
                3,
                ItemOutcome::Failed(ItemError::Fetch {
                    canonical: FetchError::Status(404),
                    fallback: FetchError::TimedOut,
                }),
            ),
        ];
        r
    }

    #[test]
    fn summary_splits_fetched_and_already_present() {
        let lines = format_run_summary(&[report()]);
        assert_eq!(lines[0], "room");
        assert_eq!(lines[1], "    2 migrated (1 fetched, 1 already present)");
    }

    #[test]
    fn summary_lists_failures_with_ids() {
        let lines = format_run_summary(&[report()]);
        assert_eq!(lines[2], "    1 failed");
        assert!(lines[3].starts_with("        id=3: fetch failed"));
        assert!(lines[3].contains("unexpected status 404"));
    }

    #[test]
    fn summary_ends_with_totals() {
        let lines = format_run_summary(&[report(), report()]);
        assert_eq!(lines.last().unwrap(), "Total: 4 migrated, 2 failed");
    }

    #[test]
    fn clean_run_has_no_failure_block() {
        let mut r = report();
        r.failed = 0;
        r.items.retain(|(_, o)| !matches!(o, ItemOutcome::Failed(_)));

        let lines = format_run_summary(&[r]);
        assert!(!lines.iter().any(|l| l.contains("failed") && l.starts_with("    ")));
        assert_eq!(lines.last().unwrap(), "Total: 2 migrated, 0 failed");
    }
}
