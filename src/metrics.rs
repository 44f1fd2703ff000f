//! Run summary.
//!
//! A [`RunSummary`] is produced by every successful [`crate::pipeline::run`]. Its
//! [`summary_line`](RunSummary::summary_line) is what the CLI prints; the full
//! struct can be saved as JSON with [`save_to_file`](RunSummary::save_to_file).

use crate::config::SinkKind;
use crate::runner::EnrichStats;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    /// CSV path, or `None` when it was removed after a successful SQL append
    pub output: Option<PathBuf>,
    #[serde(serialize_with = "display")]
    pub sink: SinkKind,
    /// Records found in the input
    pub total: usize,
    /// Records with at least one enriched field
    pub enriched: usize,
    pub enriched_fields: usize,
    /// Failed records excluded from the output
    pub skipped: usize,
    /// Per-record failures, kept or not
    pub errors: usize,
    pub columns: usize,
    pub rows_written: usize,
    /// Rows appended to the SQL table, when that sink ran
    pub rows_appended: Option<usize>,
    pub threads: usize,
    pub elapsed_ms: u128,
}

impl RunSummary {
    pub(crate) fn new(input: &Path, sink: SinkKind, stats: &EnrichStats, threads: usize) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            sink,
            total: stats.total,
            enriched: stats.enriched,
            enriched_fields: stats.enriched_fields,
            skipped: stats.dropped,
            errors: stats.errors(),
            columns: 0,
            rows_written: 0,
            rows_appended: None,
            threads,
            elapsed_ms: 0,
        }
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis();
    }

    /// One-line report: total, enriched, skipped and error counts.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "processed {} records: {} enriched, {} skipped, {} errors",
            self.total, self.enriched, self.skipped, self.errors
        )
    }

    /// Print the summary line to stdout.
    pub fn print(&self) {
        println!("{}", self.summary_line());
    }

    /// Save the summary as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let formatted = serde_json::to_string_pretty(self)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_line())
    }
}

fn display<T: fmt::Display, S: serde::Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}
