//! # geoenrich
//!
//! Turn a honeypot-style event log into a geolocated table.
//!
//! Loggers such as cowrie write one JSON object per event, back to back, with no
//! separators. `geoenrich` repairs that framing, adds location columns for every
//! field holding an IPv4 address, and writes the result as a table whose columns are
//! the union of every key seen.
//!
//! ## Stages
//!
//! 1. [`normalize`](mod@normalize) - split `{"a":1}{"a":2}` into individual records
//! 2. [`geo`] - [`RangeTable`] answers "which range contains this address?" by binary
//!    search over an IP2Location-style dataset
//! 3. [`enrich`](mod@enrich) - for each dotted-quad value, add `<field>_code`, `<field>_country`,
//!    `<field>_region` and `<field>_city`
//! 4. [`runner`] - fan records out over a rayon pool; per-record failures follow an
//!    [`ErrorPolicy`]
//! 5. [`table`] - sorted key union, one rectangular row per record
//! 6. [`io`] - CSV output, SQLite sink, JSONL intermediates, transparent compression
//!
//! [`pipeline::run`] drives all of them from a [`Config`].
//!
//! ## Quick Start
//!
//! ```
//! use geoenrich::*;
//! use std::sync::Arc;
//! # fn main() -> anyhow::Result<()> {
//! let ranges = Arc::new(RangeTable::from_entries(vec![RangeEntry {
//!     start: 134_744_064,
//!     end: 134_744_319,
//!     location: Location {
//!         code: "US".into(),
//!         country: "United States".into(),
//!         region: "California".into(),
//!         city: "Mountain View".into(),
//!     },
//! }]));
//!
//! let (table, out) = run_in_memory(
//!     r#"{"src_ip":"8.8.8.8"}{"src_ip":"bad"}"#,
//!     ranges,
//!     ExecMode::default(),
//!     ErrorPolicy::Drop,
//! )?;
//! assert_eq!(out.stats.enriched, 1);
//! assert!(table.header.contains(&"src_ip_city".to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering
//!
//! Enriched records come back in no particular order. The table's column order is
//! deterministic (sorted key names); its row order is not.
//!
//! ## Feature Flags
//!
//! - `sql` - SQLite sink via `rusqlite` (default)
//! - `compression-gzip` / `compression-zstd` - transparent `.gz` / `.zst` I/O (default)

pub mod config;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod io;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod runner;
pub mod table;
pub mod testing;
pub mod validation;

/// One event: field name to JSON value, in input order.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub use config::{Config, SinkKind};
pub use enrich::{enrich, looks_like_ipv4, parse_ipv4};
pub use error::{EngineError, FormatError, LoadError, RecordError, SinkError};
pub use geo::{Location, RangeEntry, RangeTable};
pub use metrics::RunSummary;
pub use normalize::normalize;
pub use pipeline::{run, run_in_memory};
pub use runner::{EnrichStats, ExecMode, RunOutput, Runner};
pub use table::Table;
pub use validation::{ErrorCollector, ErrorPolicy};

#[cfg(feature = "sql")]
pub use io::sql::{SqliteSink, TableSink};
