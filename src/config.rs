//! Run configuration.
//!
//! [`Config`] is plain data. [`Config::new`] derives every output location from the
//! input path the way the tool has always laid files out:
//!
//! | artifact              | default                              |
//! |-----------------------|--------------------------------------|
//! | CSV table             | `<dir>/<stem>.csv`                   |
//! | SQLite database       | `<dir>/<stem>.sqlite`                |
//! | SQL table             | `<sanitized stem>_enriched_data`     |
//! | normalized records    | `<dir>/<stem>.corrected.jsonl`       |
//! | enriched records      | `<dir>/<stem>.enhanced.jsonl`        |
//!
//! `<stem>` is the input file name without its extension (and without a trailing
//! `.gz`/`.zst`), so `logs/cowrie.json.gz` gives `logs/cowrie.csv`.

use crate::runner::ExecMode;
use crate::validation::ErrorPolicy;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the geolocation dataset looked up next to the executable.
pub const DEFAULT_GEO_DATASET: &str = "IP2LOCATION-LITE-DB9.CSV";

const COMPRESSED_EXTENSIONS: [&str; 4] = ["gz", "gzip", "zst", "zstd"];

/// Where the final table goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// CSV file only
    #[default]
    Csv,
    /// CSV file, then appended to a SQLite table
    Sql,
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "sql" => Ok(Self::Sql),
            other => Err(format!("invalid sink '{other}'; use 'csv' or 'sql'")),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Sql => "sql",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub geo_dataset: PathBuf,
    pub sink: SinkKind,
    /// CSV table path
    pub output: PathBuf,
    pub database: PathBuf,
    pub table_name: String,
    pub mode: ExecMode,
    pub error_policy: ErrorPolicy,
    /// Persist normalized and enriched records as JSONL
    pub keep_intermediate: bool,
    /// Keep the CSV after a successful SQL append
    pub keep_csv: bool,
    /// Write the run summary as JSON here
    pub summary_json: Option<PathBuf>,
    /// Write per-record failures as JSON here
    pub errors_json: Option<PathBuf>,
}

impl Config {
    /// Defaults for `input`, using the dataset next to the executable.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let stem = base_stem(&input);
        let sibling = |name: String| input.with_file_name(name);
        Self {
            output: sibling(format!("{stem}.csv")),
            database: sibling(format!("{stem}.sqlite")),
            table_name: format!("{}_enriched_data", sanitize_identifier(&stem)),
            geo_dataset: default_geo_dataset(),
            sink: SinkKind::default(),
            mode: ExecMode::default(),
            error_policy: ErrorPolicy::default(),
            keep_intermediate: false,
            keep_csv: false,
            summary_json: None,
            errors_json: None,
            input,
        }
    }

    #[must_use]
    pub fn with_geo_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.geo_dataset = path.into();
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: SinkKind) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    #[must_use]
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = path.into();
        self
    }

    #[must_use]
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    #[must_use]
    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    #[must_use]
    pub fn keep_csv(mut self, keep: bool) -> Self {
        self.keep_csv = keep;
        self
    }

    #[must_use]
    pub fn corrected_path(&self) -> PathBuf {
        self.input
            .with_file_name(format!("{}.corrected.jsonl", base_stem(&self.input)))
    }

    #[must_use]
    pub fn enhanced_path(&self) -> PathBuf {
        self.input
            .with_file_name(format!("{}.enhanced.jsonl", base_stem(&self.input)))
    }
}

/// `IP2LOCATION-LITE-DB9.CSV` beside the running executable, or in the working
/// directory when the executable path is unknown.
#[must_use]
pub fn default_geo_dataset() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_GEO_DATASET)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GEO_DATASET))
}

/// Input file name without its data extension or compression suffix.
#[must_use]
pub fn base_stem(input: &Path) -> String {
    let mut path = input.to_path_buf();
    if path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| COMPRESSED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    {
        path.set_extension("");
    }
    path.file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
#[must_use]
pub fn sanitize_identifier(s: &str) -> String {
    let out: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() { "records".to_string() } else { out }
}
