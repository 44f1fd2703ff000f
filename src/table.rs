//! Dynamic-schema table.
//!
//! Records do not share a declared schema, so the output columns are derived from
//! the data in two passes: the first collects the union of every key into a sorted
//! set, the second renders one row per record with an empty cell for each missing
//! key. Sorting makes the column order reproducible across runs and thread counts.

use crate::Record;
use serde_json::Value;
use std::collections::BTreeSet;

/// A rectangular table: a sorted header and one equally wide row per record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build the table for `records`.
    ///
    /// Every record produces a row, including empty ones.
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let keys: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect();
        let header: Vec<String> = keys.into_iter().map(str::to_string).collect();

        let rows = records
            .iter()
            .map(|r| {
                header
                    .iter()
                    .map(|k| r.get(k).map(render_cell).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Number of data rows (the header is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Cell at (`row`, column `name`), if both exist.
    #[must_use]
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Render one JSON value as a table cell.
///
/// Strings are written verbatim, `null` as an empty cell, and every other value as
/// its compact JSON text.
#[must_use]
pub fn render_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
