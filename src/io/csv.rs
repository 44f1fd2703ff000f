//! CSV output for dynamic-schema tables.
//!
//! - [`write_table`] writes the header row followed by every data row
//! - [`read_table`] reads a headed CSV back into a [`Table`]
//!
//! Both honour compression by file extension (see [`crate::io::compression`]).

use crate::io::compression::auto_detect_reader;
use crate::io::create_output;
use crate::table::Table;
use anyhow::{Context, Result, ensure};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write `table` to `path` as CSV.
///
/// Creates parent directories if they don't exist. A table without columns is
/// written as bare line terminators, one for the header and one per row, never
/// as a quoted empty field.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Returns an error if a row is not as wide as the header, or on any I/O failure.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    for (i, row) in table.rows.iter().enumerate() {
        ensure!(
            row.len() == table.header.len(),
            "row #{} has {} cells, header has {}",
            i + 1,
            row.len(),
            table.header.len()
        );
    }
    let mut w = create_output(path)?;

    if table.header.is_empty() {
        w.write_all(b"\n".repeat(table.rows.len() + 1).as_slice())
            .with_context(|| format!("write {}", path.display()))?;
        w.flush()
            .with_context(|| format!("flush {}", path.display()))?;
        return Ok(table.rows.len());
    }

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(&table.header)
        .with_context(|| format!("write CSV header to {}", path.display()))?;
    for (i, row) in table.rows.iter().enumerate() {
        wtr.write_record(row)
            .with_context(|| format!("write CSV row #{}", i + 1))?;
    }
    wtr.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(table.rows.len())
}

/// Read a headed CSV into a [`Table`].
///
/// # Errors
/// Returns an error if the file cannot be opened or a row cannot be parsed.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(rdr);
    let header = rdr
        .headers()
        .with_context(|| format!("read CSV header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
        rows.push(rec.iter().map(str::to_string).collect());
    }
    Ok(Table { header, rows })
}
