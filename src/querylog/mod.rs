use crate::error::{Result, TablecheckError};
use crate::store::Store;
use rusqlite::params;
use serde::Serialize;
use tracing::debug;

/// The log accumulates across runs: no dedup, no timestamps, no retention.
/// Unbounded growth is a known limitation of the feature.
const QUERY_LOG_DDL: &str = "CREATE TABLE IF NOT EXISTS query_logs (query_text TEXT NOT NULL)";

/// One entry of the frequency report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCount {
    pub text: String,
    pub count: u64,
}

/// Appends `text` verbatim to the query log, creating the table on first use.
pub fn log_query(store: &Store, text: &str) -> Result<()> {
    let conn = store.conn();
    conn.execute(QUERY_LOG_DDL, [])
        .map_err(TablecheckError::store)?;
    conn.execute(
        "INSERT INTO query_logs (query_text) VALUES (?1)",
        params![text],
    )
    .map_err(TablecheckError::store)?;
    debug!(query = text, "logged query");
    Ok(())
}

/// Groups logged entries by exact text and returns the `n` most frequent,
/// descending by count. Ties break by first-seen order (lowest rowid), so
/// the ranking is deterministic for a fixed log.
pub fn top_queries(store: &Store, n: u32) -> Result<Vec<QueryCount>> {
    let conn = store.conn();
    conn.execute(QUERY_LOG_DDL, [])
        .map_err(TablecheckError::store)?;
    let mut stmt = conn
        .prepare(
            "SELECT query_text, COUNT(*) AS uses FROM query_logs \
             GROUP BY query_text ORDER BY uses DESC, MIN(rowid) ASC LIMIT ?1",
        )
        .map_err(TablecheckError::store)?;
    let rows = stmt
        .query_map(params![n], |row| {
            Ok(QueryCount {
                text: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })
        .map_err(TablecheckError::store)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(TablecheckError::store)
}
