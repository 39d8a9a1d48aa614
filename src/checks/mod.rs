use crate::error::{Result, TablecheckError};
use crate::store::{vet_identifier, Store};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::ValueRef;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// RFC-5322-lite email shape: `local@domain.tld`. The default pattern for
/// format checks when the operator does not supply one.
pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});

/// How a format check treats NULL values. The original logic was implicit;
/// the policy is now explicit, and failing NULLs is the default semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NullPolicy {
    Fail,
    Allow,
}

/// A single cell as stored, without lossy stringification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Field {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<ValueRef<'_>> for Field {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Field::Null,
            ValueRef::Integer(i) => Field::Integer(i),
            ValueRef::Real(r) => Field::Real(r),
            ValueRef::Text(t) => Field::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Field::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => write!(f, "NULL"),
            Field::Integer(i) => write!(f, "{i}"),
            Field::Real(r) => write!(f, "{r}"),
            Field::Text(t) => write!(f, "{t}"),
        }
    }
}

/// A value that failed the format check. `value` is `None` when the stored
/// cell was NULL and the policy fails NULLs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatViolation {
    pub value: Option<String>,
}

/// A full row whose checked column fell outside the inclusive bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub row: Vec<Field>,
}

/// A `(key, value)` pair whose value fell below the minimum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdViolation {
    pub key: Field,
    pub value: i64,
}

/// Fetches every value of `column` and collects the ones that do not match
/// `pattern`. Read-only; violations are a normal outcome, not an error.
pub fn validate_pattern(
    store: &Store,
    table: &str,
    column: &str,
    pattern: &Regex,
    nulls: NullPolicy,
) -> Result<Vec<FormatViolation>> {
    vet_identifier(table)?;
    vet_identifier(column)?;

    let sql = format!("SELECT {column} FROM {table}");
    let mut stmt = store.conn().prepare(&sql).map_err(TablecheckError::store)?;
    let mut rows = stmt.query([]).map_err(TablecheckError::store)?;

    let mut violations = Vec::new();
    while let Some(row) = rows.next().map_err(TablecheckError::store)? {
        match Field::from(row.get_ref(0).map_err(TablecheckError::store)?) {
            Field::Null => {
                if nulls == NullPolicy::Fail {
                    violations.push(FormatViolation { value: None });
                }
            }
            field => {
                let text = field.to_string();
                if !pattern.is_match(&text) {
                    violations.push(FormatViolation { value: Some(text) });
                }
            }
        }
    }
    debug!(table, column, violations = violations.len(), "format check done");
    Ok(violations)
}

/// Flags every row whose `column` value lies outside `[min, max]`, returning
/// the full row tuple for each violation.
///
/// Comparison is numeric: INTEGER and REAL storage compare directly, TEXT
/// storage must parse as a number or the check fails with `TypeMismatch`
/// rather than silently comparing strings. NULLs are skipped, matching the
/// SQL predicate `column < min OR column > max` which NULL never satisfies.
pub fn validate_range(
    store: &Store,
    table: &str,
    column: &str,
    min: f64,
    max: f64,
) -> Result<Vec<RangeViolation>> {
    vet_identifier(table)?;
    vet_identifier(column)?;

    let sql = format!("SELECT * FROM {table}");
    let mut stmt = store.conn().prepare(&sql).map_err(TablecheckError::store)?;
    let column_index = stmt.column_index(column).map_err(TablecheckError::store)?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query([]).map_err(TablecheckError::store)?;

    let mut violations = Vec::new();
    while let Some(row) = rows.next().map_err(TablecheckError::store)? {
        let mut fields = Vec::with_capacity(column_count);
        for i in 0..column_count {
            fields.push(Field::from(row.get_ref(i).map_err(TablecheckError::store)?));
        }

        let numeric = match &fields[column_index] {
            Field::Integer(i) => *i as f64,
            Field::Real(r) => *r,
            Field::Text(t) => {
                t.trim()
                    .parse::<f64>()
                    .map_err(|_| TablecheckError::TypeMismatch {
                        column: column.to_string(),
                        value: t.clone(),
                    })?
            }
            Field::Null => continue,
        };
        if numeric < min || numeric > max {
            violations.push(RangeViolation { row: fields });
        }
    }
    debug!(table, column, violations = violations.len(), "range check done");
    Ok(violations)
}

/// Fetches `(key, value)` pairs and flags the ones whose value, coerced to
/// an integer, falls below `threshold`. Non-numeric text surfaces as a
/// `Coercion` error; it is never skipped or defaulted.
pub fn validate_minimum(
    store: &Store,
    table: &str,
    key_column: &str,
    value_column: &str,
    threshold: i64,
) -> Result<Vec<ThresholdViolation>> {
    vet_identifier(table)?;
    vet_identifier(key_column)?;
    vet_identifier(value_column)?;

    let sql = format!("SELECT {key_column}, {value_column} FROM {table}");
    let mut stmt = store.conn().prepare(&sql).map_err(TablecheckError::store)?;
    let mut rows = stmt.query([]).map_err(TablecheckError::store)?;

    let mut violations = Vec::new();
    while let Some(row) = rows.next().map_err(TablecheckError::store)? {
        let key = Field::from(row.get_ref(0).map_err(TablecheckError::store)?);
        let value = match Field::from(row.get_ref(1).map_err(TablecheckError::store)?) {
            Field::Integer(i) => i,
            Field::Real(r) => r as i64,
            Field::Text(t) => {
                t.trim()
                    .parse::<i64>()
                    .map_err(|_| TablecheckError::Coercion {
                        column: value_column.to_string(),
                        value: t.clone(),
                    })?
            }
            Field::Null => {
                return Err(TablecheckError::Coercion {
                    column: value_column.to_string(),
                    value: "NULL".to_string(),
                })
            }
        };
        if value < threshold {
            violations.push(ThresholdViolation { key, value });
        }
    }
    debug!(
        table,
        column = value_column,
        violations = violations.len(),
        "threshold check done"
    );
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn store_with(ddl: &str, rows: &[&[&dyn rusqlite::ToSql]], insert: &str) -> Store {
        let store = Store::open_in_memory().unwrap();
        store.conn().execute(ddl, []).unwrap();
        for row in rows {
            store.conn().execute(insert, *row).unwrap();
        }
        store
    }

    fn email_store(values: &[Option<&str>]) -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute("CREATE TABLE users (email)", [])
            .unwrap();
        for value in values {
            store
                .conn()
                .execute("INSERT INTO users (email) VALUES (?1)", params![value])
                .unwrap();
        }
        store
    }

    #[test]
    fn format_check_flags_bad_and_null_values() {
        let store = email_store(&[Some("a@b.com"), Some("not-an-email"), Some("")]);

        let violations =
            validate_pattern(&store, "users", "email", &EMAIL_PATTERN, NullPolicy::Fail).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].value.as_deref(), Some("not-an-email"));
        assert_eq!(violations[1].value.as_deref(), Some(""));
    }

    #[test]
    fn format_check_null_policy_is_explicit() {
        let store = email_store(&[Some("a@b.com"), None]);

        let failing =
            validate_pattern(&store, "users", "email", &EMAIL_PATTERN, NullPolicy::Fail).unwrap();
        assert_eq!(failing.len(), 1);
        assert_eq!(failing[0].value, None);

        let allowing =
            validate_pattern(&store, "users", "email", &EMAIL_PATTERN, NullPolicy::Allow).unwrap();
        assert!(allowing.is_empty());
    }

    #[test]
    fn range_check_flags_rows_outside_inclusive_bounds() {
        let store = store_with(
            "CREATE TABLE users (id, age)",
            &[&[&1i64, &10i64], &[&2i64, &25i64], &[&3i64, &45i64]],
            "INSERT INTO users (id, age) VALUES (?1, ?2)",
        );

        let violations = validate_range(&store, "users", "age", 20.0, 40.0).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].row, vec![Field::Integer(1), Field::Integer(10)]);
        assert_eq!(violations[1].row, vec![Field::Integer(3), Field::Integer(45)]);
    }

    #[test]
    fn range_check_bounds_are_inclusive() {
        let store = store_with(
            "CREATE TABLE users (id, age)",
            &[&[&1i64, &20i64], &[&2i64, &40i64]],
            "INSERT INTO users (id, age) VALUES (?1, ?2)",
        );

        let violations = validate_range(&store, "users", "age", 20.0, 40.0).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn range_check_coerces_numeric_text() {
        let store = store_with(
            "CREATE TABLE users (id, age)",
            &[&[&1i64, &"15"], &[&2i64, &"30"]],
            "INSERT INTO users (id, age) VALUES (?1, ?2)",
        );

        let violations = validate_range(&store, "users", "age", 20.0, 40.0).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].row,
            vec![Field::Integer(1), Field::Text("15".to_string())]
        );
    }

    #[test]
    fn range_check_refuses_string_comparison() {
        let store = store_with(
            "CREATE TABLE users (id, age)",
            &[&[&1i64, &"twenty"]],
            "INSERT INTO users (id, age) VALUES (?1, ?2)",
        );

        let err = validate_range(&store, "users", "age", 20.0, 40.0).unwrap_err();
        assert!(matches!(err, TablecheckError::TypeMismatch { .. }));
    }

    #[test]
    fn threshold_check_flags_values_below_minimum() {
        let store = store_with(
            "CREATE TABLE users (id, age)",
            &[&[&1i64, &"17"], &[&2i64, &"22"]],
            "INSERT INTO users (id, age) VALUES (?1, ?2)",
        );

        let violations = validate_minimum(&store, "users", "id", "age", 18).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].key, Field::Integer(1));
        assert_eq!(violations[0].value, 17);
    }

    #[test]
    fn threshold_check_surfaces_coercion_failure() {
        let store = store_with(
            "CREATE TABLE users (id, age)",
            &[&[&1i64, &"abc"]],
            "INSERT INTO users (id, age) VALUES (?1, ?2)",
        );

        let err = validate_minimum(&store, "users", "id", "age", 18).unwrap_err();
        assert!(matches!(err, TablecheckError::Coercion { .. }));
    }

    #[test]
    fn checks_compose_against_the_same_table() {
        let store = store_with(
            "CREATE TABLE users (id, email, age)",
            &[
                &[&1i64, &"a@b.com", &17i64],
                &[&2i64, &"nope", &50i64],
            ],
            "INSERT INTO users (id, email, age) VALUES (?1, ?2, ?3)",
        );

        let format =
            validate_pattern(&store, "users", "email", &EMAIL_PATTERN, NullPolicy::Fail).unwrap();
        let range = validate_range(&store, "users", "age", 20.0, 40.0).unwrap();
        let threshold = validate_minimum(&store, "users", "id", "age", 18).unwrap();

        assert_eq!(format.len(), 1);
        assert_eq!(range.len(), 2);
        assert_eq!(threshold.len(), 1);

        // Read-only checks: the table is unchanged afterwards.
        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
