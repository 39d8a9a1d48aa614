use crate::error::{Result, TablecheckError};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// SQL keywords that may not be used as table or column names. Lowercase;
/// matching is case-insensitive.
const RESERVED_WORDS: &[&str] = &[
    "add", "all", "alter", "and", "as", "between", "by", "case", "check", "column", "commit",
    "create", "default", "delete", "distinct", "drop", "else", "end", "exists", "foreign", "from",
    "group", "having", "in", "index", "insert", "into", "is", "join", "key", "like", "limit",
    "not", "null", "offset", "on", "or", "order", "primary", "references", "rollback", "select",
    "set", "table", "then", "transaction", "union", "unique", "update", "values", "when", "where",
];

/// Checks that a caller-supplied name is safe to interpolate into DDL or a
/// query. Names must start with a letter or underscore, contain only ASCII
/// alphanumerics and underscores, and not collide with a reserved word.
///
/// Table and column names come from the operator (CSV headers, config), so
/// they are interpolated into statement text rather than bound; this vetting
/// step is what keeps untrusted strings out of structural query positions.
pub fn vet_identifier(name: &str) -> Result<()> {
    let invalid = |reason: &str| TablecheckError::InvalidIdentifier {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("name is empty")),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => return Err(invalid("must start with a letter or underscore")),
    }
    if let Some(bad) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(invalid(&format!("character '{bad}' is not allowed")));
    }
    if RESERVED_WORDS.contains(&name.to_ascii_lowercase().as_str()) {
        return Err(invalid("reserved word"));
    }
    Ok(())
}

/// An open handle to the file-backed relational store. Owned exclusively by
/// the calling process for its lifetime; dropping it releases the underlying
/// connection, so early-return failure paths never leak the handle.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at `path`, creating the database file if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| TablecheckError::Connection {
            message: format!("failed to open store at {}: {e}", path.display()),
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| TablecheckError::Connection {
                message: format!("failed to configure store: {e}"),
            })?;
        info!(path = %path.display(), "opened store");
        Ok(Self { conn })
    }

    /// Open a transient in-memory store. Used by tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| TablecheckError::Connection {
            message: format!("failed to open in-memory store: {e}"),
        })?;
        Ok(Self { conn })
    }

    /// Explicitly close the handle, surfacing any error the final flush
    /// reports. Dropping the `Store` closes it too, but silently.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| TablecheckError::Connection {
                message: format!("failed to close store: {e}"),
            })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
