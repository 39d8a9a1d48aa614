use crate::error::{Result, TablecheckError};
use crate::store::{vet_identifier, Store};
use csv::ReaderBuilder;
use rusqlite::params_from_iter;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Outcome of a successful load, returned to the caller for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub table: String,
    pub columns: Vec<String>,
    pub rows_inserted: u64,
}

/// Reads a delimited source whose first record is the header row, creates
/// `table_name` if it does not already exist (one column per header, store
/// default affinity), and inserts every data row positionally.
///
/// Column and table names are vetted and then interpolated into the DDL;
/// row values are always bound parameters. The whole load runs in a single
/// transaction: any failure (unreadable row, width mismatch, write error)
/// rolls back and leaves the table untouched.
///
/// Width policy is reject-all: a data row whose field count differs from the
/// header fails the entire load rather than being skipped, so a committed
/// load never contains positionally misaligned rows.
pub fn load_csv<P: AsRef<Path>>(store: &Store, source: P, table_name: &str) -> Result<LoadSummary> {
    let source = source.as_ref();
    vet_identifier(table_name)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(source)
        .map_err(|e| TablecheckError::Load {
            cause: format!("cannot read source {}: {e}", source.display()),
        })?;
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| TablecheckError::Load {
            cause: format!("malformed header row: {e}"),
        })?,
        None => {
            return Err(TablecheckError::Load {
                cause: format!("header row absent: {} is empty", source.display()),
            })
        }
    };
    let columns: Vec<String> = header.iter().map(str::to_string).collect();

    let mut seen = HashSet::new();
    for column in &columns {
        vet_identifier(column)?;
        if !seen.insert(column.to_ascii_lowercase()) {
            return Err(TablecheckError::Load {
                cause: format!("duplicate column name '{column}' in header"),
            });
        }
    }

    let tx = store
        .conn()
        .unchecked_transaction()
        .map_err(TablecheckError::store)?;

    // Identifiers are vetted above; values below go through bound parameters.
    let create = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table_name,
        columns.join(", ")
    );
    tx.execute(&create, []).map_err(|e| TablecheckError::Load {
        cause: format!("creating table '{table_name}': {e}"),
    })?;

    let placeholders = vec!["?"; columns.len()].join(", ");
    let insert = format!("INSERT INTO {table_name} VALUES ({placeholders})");
    let mut stmt = tx.prepare(&insert).map_err(TablecheckError::store)?;

    let mut rows_inserted = 0u64;
    for (index, record) in records.enumerate() {
        // Header is line 1, so data row `index` sits on line `index + 2`.
        let line = index + 2;
        let record = record.map_err(|e| TablecheckError::Load {
            cause: format!("reading row at line {line}: {e}"),
        })?;
        if record.len() != columns.len() {
            return Err(TablecheckError::Load {
                cause: format!(
                    "row at line {line} has {} fields, header declares {}; load rejected",
                    record.len(),
                    columns.len()
                ),
            });
        }
        stmt.execute(params_from_iter(record.iter()))
            .map_err(|e| TablecheckError::Load {
                cause: format!("inserting row at line {line}: {e}"),
            })?;
        rows_inserted += 1;
    }
    drop(stmt);

    tx.commit().map_err(|e| TablecheckError::Load {
        cause: format!("committing load into '{table_name}': {e}"),
    })?;

    info!(
        table = table_name,
        rows = rows_inserted,
        source = %source.display(),
        "load complete"
    );

    Ok(LoadSummary {
        table: table_name.to_string(),
        columns,
        rows_inserted,
    })
}
