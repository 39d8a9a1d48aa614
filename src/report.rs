//! Console rendering of structured check results. The core components never
//! print; everything user-facing funnels through here or the JSON output.

use crate::checks::{FormatViolation, RangeViolation, ThresholdViolation};
use crate::ingest::LoadSummary;
use crate::querylog::QueryCount;

pub fn render_load(summary: &LoadSummary) {
    println!("\n📊 Load summary for '{}':", summary.table);
    println!("   Columns: {}", summary.columns.join(", "));
    println!("   Rows inserted: {}", summary.rows_inserted);
}

pub fn render_format(table: &str, column: &str, violations: &[FormatViolation]) {
    if violations.is_empty() {
        println!("✅ All values in {table}.{column} match the expected format");
        return;
    }
    println!(
        "⚠️  {} value(s) in {table}.{column} fail the format check:",
        violations.len()
    );
    for violation in violations {
        match &violation.value {
            Some(value) => println!("   - '{value}'"),
            None => println!("   - NULL"),
        }
    }
}

pub fn render_range(table: &str, column: &str, min: f64, max: f64, violations: &[RangeViolation]) {
    if violations.is_empty() {
        println!("✅ All rows in {table} have {column} within [{min}, {max}]");
        return;
    }
    println!(
        "⚠️  {} row(s) in {table} have {column} outside [{min}, {max}]:",
        violations.len()
    );
    for violation in violations {
        let cells: Vec<String> = violation.row.iter().map(|f| f.to_string()).collect();
        println!("   - ({})", cells.join(", "));
    }
}

pub fn render_threshold(table: &str, value_column: &str, minimum: i64, violations: &[ThresholdViolation]) {
    if violations.is_empty() {
        println!("✅ All rows in {table} meet the {value_column} minimum of {minimum}");
        return;
    }
    println!(
        "⚠️  {} row(s) in {table} fall below the {value_column} minimum of {minimum}:",
        violations.len()
    );
    for violation in violations {
        println!("   - key {} has value {}", violation.key, violation.value);
    }
}

pub fn render_top_queries(entries: &[QueryCount]) {
    if entries.is_empty() {
        println!("📈 Query log is empty");
        return;
    }
    println!("📈 Most frequent queries:");
    for (rank, entry) in entries.iter().enumerate() {
        println!("   {}. ({}×) {}", rank + 1, entry.count, entry.text);
    }
}
