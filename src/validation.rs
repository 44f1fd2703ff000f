//! Per-record failure handling.
//!
//! A record that cannot be enriched never takes the batch down unless asked to.
//! [`ErrorPolicy`] picks what happens to it and [`ErrorCollector`] keeps the
//! failures for the end-of-run report.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What the dispatcher does with a record whose enrichment fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Exclude the record and count the error
    #[default]
    Drop,
    /// Keep the original object unenriched and count the error
    Passthrough,
    /// Abort the batch on the first error
    Fail,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" | "skip" => Ok(Self::Drop),
            "passthrough" => Ok(Self::Passthrough),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "invalid error policy '{other}'; use 'drop', 'passthrough', or 'fail'"
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drop => "drop",
            Self::Passthrough => "passthrough",
            Self::Fail => "fail",
        })
    }
}

/// One failed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Position of the record in the normalized input
    pub index: usize,
    pub message: String,
    /// Whether the original record was kept in the output
    pub kept: bool,
}

/// Collects per-record failures for batch reporting.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    failures: Vec<RecordFailure>,
}

impl ErrorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, index: usize, error: &RecordError, kept: bool) {
        self.failures.push(RecordFailure {
            index,
            message: error.to_string(),
            kept,
        });
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    /// Failures whose record was excluded from the output.
    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.failures.iter().filter(|f| !f.kept).count()
    }

    /// Failures sorted by record index.
    #[must_use]
    pub fn failures(&self) -> Vec<&RecordFailure> {
        let mut out: Vec<_> = self.failures.iter().collect();
        out.sort_by_key(|f| f.index);
        out
    }

    pub fn merge(&mut self, other: Self) {
        self.failures.extend(other.failures);
    }

    /// Export failures to JSON.
    ///
    /// # Errors
    /// Propagates serializer errors.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.failures())
    }

    /// Write failures to `path` as JSON.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl fmt::Display for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCollector({} errors)", self.error_count())
    }
}
