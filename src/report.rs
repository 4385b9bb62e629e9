//! Run artifacts: the mapping document and the rewrite statements.
//!
//! A migration run never touches the database. Reconciliation is handed off
//! through two files written at the end of the run:
//!
//! - `mapping.json` — per table, the `{id, old_url, new_url, filename}`
//!   record of every migrated (or already-migrated) item.
//! - `update_urls.sql` — one `UPDATE` statement per record, applied by the
//!   operator once the uploaded assets are verified.
//!
//! Both are pure functions of the run outcome, so re-running against the
//! same database state regenerates them byte-for-byte.

use crate::driver::TableReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// One reconciliation record: where an asset was and where it now lives.
///
/// `old_url` is the raw database value (the proxy URL, not the extracted
/// canonical one) so the generated UPDATE matches the row it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingRecord {
    pub id: u64,
    pub old_url: String,
    pub new_url: String,
    pub filename: String,
}

/// Serialize the mapping document, keyed by table name.
pub fn mapping_json(reports: &[TableReport]) -> serde_json::Result<String> {
    let by_table: BTreeMap<&str, &Vec<MappingRecord>> = reports
        .iter()
        .map(|r| (r.spec.table.as_str(), &r.records))
        .collect();
    serde_json::to_string_pretty(&by_table)
}

/// Generate the rewrite statements for every recorded item.
pub fn rewrite_statements(reports: &[TableReport]) -> String {
    let mut out = String::from("-- Apply after the uploaded assets are verified in the object store.\n\n");

    let blocks: Vec<String> = reports
        .iter()
        .map(|report| {
            report
                .records
                .iter()
                .map(|rec| {
                    format!(
                        "UPDATE {table} SET {url_column} = '{new_url}' WHERE {id_column} = {id};\n",
                        table = report.spec.table,
                        url_column = report.spec.url_column,
                        new_url = sql_escape(&rec.new_url),
                        id_column = report.spec.id_column,
                        id = rec.id,
                    )
                })
                .collect()
        })
        .collect();

    out.push_str(&blocks.join("\n"));
    out
}

fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Write both artifacts into `out_dir`, returning their paths.
pub fn write_artifacts(reports: &[TableReport], out_dir: &Path) -> io::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)?;

    let mapping_path = out_dir.join("mapping.json");
    let mapping = mapping_json(reports).map_err(io::Error::other)?;
    std::fs::write(&mapping_path, mapping)?;

    let sql_path = out_dir.join("update_urls.sql");
    std::fs::write(&sql_path, rewrite_statements(reports))?;

    Ok((mapping_path, sql_path))
}
