//! Geolocation range table.
//!
//! A [`RangeTable`] maps IPv4 addresses (as big-endian `u32`) to a [`Location`] using
//! the disjoint, sorted intervals of an IP2Location-style dataset:
//!
//! ```text
//! "134744064","134744319","US","United States","California","Mountain View",...
//! ```
//!
//! Only the first six columns are consumed. The table is immutable after loading and
//! is shared between enrichment workers as an `Arc<RangeTable>`.

use crate::error::LoadError;
use crate::io::compression::auto_detect_reader;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::Path;

/// Place attached to an address range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub code: String,
    pub country: String,
    pub region: String,
    pub city: String,
}

/// One row of the dataset: an inclusive `[start, end]` interval and its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub start: u32,
    pub end: u32,
    pub location: Location,
}

impl RangeEntry {
    #[must_use]
    pub fn contains(&self, ip: u32) -> bool {
        self.start <= ip && ip <= self.end
    }
}

/// Sorted, immutable interval set answering point-in-interval queries in O(log n).
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
}

impl RangeTable {
    /// Build a table from entries in any order.
    ///
    /// Entries are sorted by `start`. Overlap is not checked; the dataset
    /// guarantees disjoint coverage.
    #[must_use]
    pub fn from_entries(mut entries: Vec<RangeEntry>) -> Self {
        entries.sort_by_key(|e| e.start);
        Self { entries }
    }

    /// Load a headerless geolocation CSV.
    ///
    /// Gzip/zstd files are decompressed transparently and a leading UTF-8 BOM is
    /// ignored. Rows need at least six columns; extra columns are skipped.
    ///
    /// # Errors
    /// [`LoadError::Io`] if the file cannot be opened or read, [`LoadError::Malformed`]
    /// if a row is short, has non-numeric bounds, or has `start > end`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let f = File::open(path).map_err(io_err)?;
        let rdr = auto_detect_reader(f, path)
            .map_err(|e| io_err(std::io::Error::other(e.to_string())))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);

        let mut entries = Vec::new();
        let mut record = csv::StringRecord::new();
        loop {
            match rdr.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    let line = e.position().map_or(0, csv::Position::line);
                    return Err(match e.into_kind() {
                        csv::ErrorKind::Io(source) => io_err(source),
                        other => LoadError::Malformed {
                            path: path.to_path_buf(),
                            line,
                            reason: format!("{other:?}"),
                        },
                    });
                }
            }
            let line = record.position().map_or(0, csv::Position::line);
            let entry = parse_row(&record).map_err(|reason| LoadError::Malformed {
                path: path.to_path_buf(),
                line,
                reason,
            })?;
            entries.push(entry);
        }
        Ok(Self::from_entries(entries))
    }

    /// Find the location covering `ip`, or `None` when no interval contains it.
    #[must_use]
    pub fn lookup(&self, ip: u32) -> Option<&Location> {
        // index of the first entry starting after ip; the candidate sits just before it
        let idx = self.entries.partition_point(|e| e.start <= ip);
        let candidate = self.entries.get(idx.checked_sub(1)?)?;
        candidate.contains(ip).then_some(&candidate.location)
    }

    #[must_use]
    pub fn lookup_addr(&self, addr: Ipv4Addr) -> Option<&Location> {
        self.lookup(u32::from(addr))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }
}

fn parse_row(record: &csv::StringRecord) -> Result<RangeEntry, String> {
    if record.len() < 6 {
        return Err(format!("expected at least 6 columns, found {}", record.len()));
    }
    let field = |i: usize| record.get(i).unwrap_or_default().trim();
    let bound = |i: usize, name: &str| {
        let raw = field(i).trim_start_matches('\u{feff}');
        raw.parse::<u32>()
            .map_err(|e| format!("{name} {raw:?} is not an IPv4 decimal: {e}"))
    };
    let start = bound(0, "start")?;
    let end = bound(1, "end")?;
    if start > end {
        return Err(format!("start {start} is greater than end {end}"));
    }
    Ok(RangeEntry {
        start,
        end,
        location: Location {
            code: field(2).to_string(),
            country: field(3).to_string(),
            region: field(4).to_string(),
            city: field(5).to_string(),
        },
    })
}
