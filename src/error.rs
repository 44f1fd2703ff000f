//! Error types for the enrichment engine.
//!
//! - [`LoadError`] - the geolocation dataset could not be loaded (fatal)
//! - [`FormatError`] - the input log could not be repaired into JSON (fatal)
//! - [`RecordError`] - a single record could not be enriched (non-fatal by default)
//! - [`SinkError`] - the relational append failed (fatal to the sink step only)
//! - [`EngineError`] - top-level error returned by [`crate::pipeline::run`]

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Geolocation dataset missing or malformed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Input could not be normalized
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A record failed under [`crate::validation::ErrorPolicy::Fail`]
    #[error("record #{index} failed: {source}")]
    Record {
        index: usize,
        #[source]
        source: RecordError,
    },

    /// Relational sink failed; the CSV output is kept
    #[error("sink failed (table output kept at {}): {source}", kept.display())]
    Sink {
        kept: PathBuf,
        #[source]
        source: SinkError,
    },

    /// The worker pool could not be created
    #[error("cannot build worker pool: {0}")]
    Pool(String),

    /// Writing the table or an intermediate artifact failed
    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

impl EngineError {
    /// Whether the CLI should answer this error with its usage text.
    ///
    /// Only problems with the two input files qualify.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Load(_) | Self::Format(_))
    }
}

/// Geolocation dataset errors.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File missing or unreadable
    #[error("cannot read geolocation dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be turned into a range entry
    #[error("malformed geolocation dataset {} at line {line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

/// Input framing errors.
#[derive(Error, Debug)]
pub enum FormatError {
    /// File missing or unreadable
    #[error("cannot read input {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The repaired text still is not a JSON array
    #[error("{} is not repairable JSON (line {line}, column {column}): {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl FormatError {
    /// Attach the offending file name to an error produced from in-memory text.
    #[must_use]
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Io { source, .. } => Self::Io {
                path: path.into(),
                source,
            },
            Self::Parse {
                line,
                column,
                source,
                ..
            } => Self::Parse {
                path: path.into(),
                line,
                column,
                source,
            },
        }
    }
}

/// Per-record enrichment errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The element is a JSON array, string, number, bool or null
    #[error("expected a JSON object, found {kind}")]
    NotAnObject { kind: &'static str },

    /// A derived location key already exists with a different value
    #[error("derived key {key:?} already present with a different value")]
    KeyCollision { key: String },
}

/// Relational sink errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The database could not be opened
    #[error("cannot open database {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    /// The existing table lacks columns of the new header
    #[error("table {table:?} is missing columns {missing:?}")]
    SchemaMismatch { table: String, missing: Vec<String> },

    /// Statement preparation or execution failed
    #[error("sql error: {0}")]
    Sql(String),
}

#[cfg(feature = "sql")]
impl From<rusqlite::Error> for SinkError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sql(e.to_string())
    }
}
