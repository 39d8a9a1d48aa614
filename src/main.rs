use anyhow::Context;
use clap::{Parser, Subcommand};
use regex::Regex;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use tablecheck::checks::{self, NullPolicy, EMAIL_PATTERN};
use tablecheck::config::Config;
use tablecheck::ingest;
use tablecheck::querylog;
use tablecheck::report;
use tablecheck::store::Store;
use tablecheck::logging;

#[derive(Parser)]
#[command(name = "tablecheck")]
#[command(about = "CSV-to-SQLite ingestion with data-quality checks")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full pass (load + configured checks + query analytics) from a TOML config
    Run {
        /// Path to the run configuration
        #[arg(long)]
        config: PathBuf,
        /// Emit results as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Load a delimited source into a table
    Load {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        table: String,
    },
    /// Check a column against a regex pattern (defaults to an email shape)
    CheckFormat {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        column: String,
        /// Regex override for the format check
        #[arg(long)]
        pattern: Option<String>,
        /// Treat NULL values as acceptable rather than violations
        #[arg(long)]
        allow_null: bool,
    },
    /// Check that a numeric column lies within inclusive bounds
    CheckRange {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        column: String,
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
    },
    /// Check that a numeric column meets a minimum value
    CheckThreshold {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        key_column: String,
        #[arg(long)]
        value_column: String,
        #[arg(long)]
        minimum: i64,
    },
    /// Show the most frequently logged queries
    TopQueries {
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

fn compile_pattern(pattern: Option<&str>) -> anyhow::Result<Regex> {
    match pattern {
        Some(raw) => Regex::new(raw).with_context(|| format!("invalid pattern '{raw}'")),
        None => Ok(EMAIL_PATTERN.clone()),
    }
}

fn run_pass(config_path: &PathBuf, as_json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let store = Store::open(&config.store_path)?;

    let summary = ingest::load_csv(&store, &config.source_path, &config.table_name)?;
    let mut output = json!({ "load": summary });
    if !as_json {
        report::render_load(&summary);
    }

    if let Some(format) = &config.checks.format {
        let pattern = compile_pattern(format.pattern.as_deref())?;
        let nulls = if format.allow_null {
            NullPolicy::Allow
        } else {
            NullPolicy::Fail
        };
        querylog::log_query(
            &store,
            &format!("SELECT {} FROM {}", format.column, config.table_name),
        )?;
        let violations = checks::validate_pattern(
            &store,
            &config.table_name,
            &format.column,
            &pattern,
            nulls,
        )?;
        if as_json {
            output["format"] = json!({ "column": format.column, "violations": violations });
        } else {
            report::render_format(&config.table_name, &format.column, &violations);
        }
    }

    if let Some(range) = &config.checks.range {
        querylog::log_query(
            &store,
            &format!(
                "SELECT * FROM {} WHERE {} < {} OR {} > {}",
                config.table_name, range.column, range.min, range.column, range.max
            ),
        )?;
        let violations =
            checks::validate_range(&store, &config.table_name, &range.column, range.min, range.max)?;
        if as_json {
            output["range"] = json!({ "column": range.column, "violations": violations });
        } else {
            report::render_range(&config.table_name, &range.column, range.min, range.max, &violations);
        }
    }

    if let Some(threshold) = &config.checks.threshold {
        querylog::log_query(
            &store,
            &format!(
                "SELECT {}, {} FROM {}",
                threshold.key_column, threshold.value_column, config.table_name
            ),
        )?;
        let violations = checks::validate_minimum(
            &store,
            &config.table_name,
            &threshold.key_column,
            &threshold.value_column,
            threshold.minimum,
        )?;
        if as_json {
            output["threshold"] =
                json!({ "column": threshold.value_column, "violations": violations });
        } else {
            report::render_threshold(
                &config.table_name,
                &threshold.value_column,
                threshold.minimum,
                &violations,
            );
        }
    }

    let top = querylog::top_queries(&store, config.analytics.top_n)?;
    if as_json {
        output["top_queries"] = json!(top);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        report::render_top_queries(&top);
    }

    store.close()?;
    info!("data-quality pass complete");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, json } => run_pass(&config, json)?,
        Commands::Load { store, source, table } => {
            let store = Store::open(&store)?;
            let summary = ingest::load_csv(&store, &source, &table)?;
            report::render_load(&summary);
            store.close()?;
        }
        Commands::CheckFormat {
            store,
            table,
            column,
            pattern,
            allow_null,
        } => {
            let pattern = compile_pattern(pattern.as_deref())?;
            let nulls = if allow_null {
                NullPolicy::Allow
            } else {
                NullPolicy::Fail
            };
            let store = Store::open(&store)?;
            querylog::log_query(&store, &format!("SELECT {column} FROM {table}"))?;
            let violations = checks::validate_pattern(&store, &table, &column, &pattern, nulls)?;
            report::render_format(&table, &column, &violations);
            store.close()?;
        }
        Commands::CheckRange {
            store,
            table,
            column,
            min,
            max,
        } => {
            let store = Store::open(&store)?;
            querylog::log_query(
                &store,
                &format!("SELECT * FROM {table} WHERE {column} < {min} OR {column} > {max}"),
            )?;
            let violations = checks::validate_range(&store, &table, &column, min, max)?;
            report::render_range(&table, &column, min, max, &violations);
            store.close()?;
        }
        Commands::CheckThreshold {
            store,
            table,
            key_column,
            value_column,
            minimum,
        } => {
            let store = Store::open(&store)?;
            querylog::log_query(
                &store,
                &format!("SELECT {key_column}, {value_column} FROM {table}"),
            )?;
            let violations =
                checks::validate_minimum(&store, &table, &key_column, &value_column, minimum)?;
            report::render_threshold(&table, &value_column, minimum, &violations);
            store.close()?;
        }
        Commands::TopQueries { store, limit } => {
            let store = Store::open(&store)?;
            let top = querylog::top_queries(&store, limit)?;
            report::render_top_queries(&top);
            store.close()?;
        }
    }

    Ok(())
}
