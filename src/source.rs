//! The row-iteration contract over the relational store.
//!
//! The driver never speaks SQL for reads: it asks a [`RowSource`] for the
//! ordered `(identity, url)` pairs of one table whose URL column matches a
//! pattern, and treats the result purely as an iterable. The production
//! implementation is a thin MySQL wrapper; tests substitute an in-memory
//! source.
//!
//! Table and column names are operator input (CLI), not untrusted data, and
//! MySQL cannot bind identifiers — they are interpolated, while the URL
//! pattern is always a bound parameter.

use crate::config::DbConfig;
use mysql::prelude::Queryable;
use mysql::{OptsBuilder, Pool};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("database error: {0}")]
    Db(#[from] mysql::Error),
}

/// One row awaiting migration. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationItem {
    pub identity: u64,
    pub source_url: String,
}

/// Which table to migrate and where its assets land.
///
/// Parsed from the CLI form `table:id_column:url_column:folder`, e.g.
/// `accommodation_image:image_id:image_url:resizing_accommodation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table: String,
    pub id_column: String,
    pub url_column: String,
    /// Destination folder (and object key prefix) for this table's assets.
    pub folder: String,
}

impl FromStr for TableSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [table, id_column, url_column, folder] = parts.as_slice() else {
            return Err(format!(
                "expected table:id_column:url_column:folder, got {s:?}"
            ));
        };
        if parts.iter().any(|p| p.is_empty()) {
            return Err(format!("empty segment in table spec {s:?}"));
        }
        Ok(Self {
            table: table.to_string(),
            id_column: id_column.to_string(),
            url_column: url_column.to_string(),
            folder: folder.to_string(),
        })
    }
}

/// Ordered iteration over a table's `(identity, url)` pairs.
pub trait RowSource {
    fn rows(
        &mut self,
        spec: &TableSpec,
        url_pattern: &str,
    ) -> Result<Vec<MigrationItem>, SourceError>;
}

/// MySQL-backed row source.
pub struct MySqlRowSource {
    pool: Pool,
}

impl MySqlRowSource {
    /// Connect to the database. Connection failures are fatal to the run —
    /// they surface before any item is processed.
    pub fn connect(config: &DbConfig) -> Result<Self, SourceError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));
        Ok(Self {
            pool: Pool::new(opts)?,
        })
    }
}

impl RowSource for MySqlRowSource {
    fn rows(
        &mut self,
        spec: &TableSpec,
        url_pattern: &str,
    ) -> Result<Vec<MigrationItem>, SourceError> {
        let mut conn = self.pool.get_conn()?;
        let stmt = format!(
            "SELECT {id}, {url} FROM {table} WHERE {url} LIKE ? ORDER BY {id}",
            id = spec.id_column,
            url = spec.url_column,
            table = spec.table,
        );

        let rows: Vec<(u64, String)> = conn.exec(stmt, (url_pattern,))?;
        Ok(rows
            .into_iter()
            .map(|(identity, source_url)| MigrationItem {
                identity,
                source_url,
            })
            .collect())
    }
}
