//! End-to-end run: raw log in, table out.
//!
//! Stages, all in memory:
//!
//! 1. load the [`RangeTable`] (fatal on [`LoadError`](crate::error::LoadError))
//! 2. build the worker pool (fatal when it cannot be created)
//! 3. [`normalize_file`] the input (fatal on [`FormatError`](crate::error::FormatError))
//! 4. [`Runner::run_all`] the records
//! 5. build the [`Table`] and write it as CSV
//! 6. for the SQL sink, append the table and drop the CSV unless asked to keep it
//!
//! Stages 3 and 4 can also persist their records as JSONL when
//! [`Config::keep_intermediate`] is set; nothing reads those files back.

use crate::config::{Config, SinkKind};
use crate::error::{EngineError, SinkError};
use crate::geo::RangeTable;
use crate::io::csv::write_table;
use crate::io::jsonl::write_jsonl_vec;
use crate::metrics::RunSummary;
use crate::normalize::{normalize, normalize_file};
use crate::runner::{ExecMode, RunOutput, Runner};
use crate::table::Table;
use crate::validation::ErrorPolicy;
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Normalize, enrich and tabulate raw log text without touching the filesystem.
///
/// # Errors
/// [`EngineError::Format`] for unrepairable text, [`EngineError::Pool`] for an
/// unusable worker count, [`EngineError::Record`] under [`ErrorPolicy::Fail`].
pub fn run_in_memory(
    raw: &str,
    table: Arc<RangeTable>,
    mode: ExecMode,
    policy: ErrorPolicy,
) -> Result<(Table, RunOutput), EngineError> {
    let runner = Runner::new(table, mode, policy)?;
    let values = normalize(raw)?;
    let out = runner.run_all(values)?;
    let tab = Table::from_records(&out.records);
    Ok((tab, out))
}

/// Run the whole pipeline described by `config`.
///
/// # Errors
/// Load, format, pool and write failures abort the run. A sink failure returns
/// [`EngineError::Sink`] after the CSV has been written; the CSV is left in place.
pub fn run(config: &Config) -> Result<RunSummary, EngineError> {
    let started = Instant::now();

    info!(dataset = %config.geo_dataset.display(), "loading geolocation dataset");
    let ranges = Arc::new(RangeTable::load(&config.geo_dataset)?);
    info!(entries = ranges.len(), "geolocation dataset loaded");

    let runner = Runner::new(Arc::clone(&ranges), config.mode, config.error_policy)?;

    info!(input = %config.input.display(), "normalizing input");
    let values = normalize_file(&config.input)?;
    info!(records = values.len(), "input normalized");
    if config.keep_intermediate {
        let path = config.corrected_path();
        write_jsonl_vec(&path, &values)?;
        debug!(path = %path.display(), "wrote normalized records");
    }

    let out = runner.run_all(values)?;
    if config.keep_intermediate {
        let path = config.enhanced_path();
        write_jsonl_vec(&path, &out.records)?;
        debug!(path = %path.display(), "wrote enriched records");
    }

    let tab = Table::from_records(&out.records);
    let mut summary = RunSummary::new(&config.input, config.sink, &out.stats, runner.threads());
    summary.columns = tab.width();

    info!(output = %config.output.display(), columns = tab.width(), rows = tab.len(), "writing table");
    summary.rows_written = write_table(&config.output, &tab)?;
    summary.output = Some(config.output.clone());

    if let Some(path) = &config.errors_json {
        out.errors
            .write_to_file(path)
            .with_context(|| format!("write record errors to {}", path.display()))?;
    }

    if config.sink == SinkKind::Sql {
        let appended = append_sql(config, &tab).map_err(|source| EngineError::Sink {
            kept: config.output.clone(),
            source,
        })?;
        summary.rows_appended = Some(appended);
        if !config.keep_csv {
            match std::fs::remove_file(&config.output) {
                Ok(()) => summary.output = None,
                Err(e) => warn!(path = %config.output.display(), error = %e, "cannot remove CSV after SQL append"),
            }
        }
    }

    summary.finish(started.elapsed());
    if let Some(path) = &config.summary_json {
        summary.save_to_file(path)?;
    }
    info!(elapsed_ms = summary.elapsed_ms, "run finished");
    Ok(summary)
}

#[cfg(feature = "sql")]
fn append_sql(config: &Config, tab: &Table) -> Result<usize, SinkError> {
    use crate::io::sql::{SqliteSink, TableSink};

    info!(
        database = %config.database.display(),
        table = %config.table_name,
        "appending to SQL table"
    );
    let mut sink = SqliteSink::open(&config.database)?;
    sink.append(&config.table_name, tab)
}

#[cfg(not(feature = "sql"))]
fn append_sql(config: &Config, _tab: &Table) -> Result<usize, SinkError> {
    Err(SinkError::Open {
        path: config.database.clone(),
        reason: "built without the `sql` feature".into(),
    })
}
