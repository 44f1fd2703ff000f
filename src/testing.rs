//! Testing utilities for enrichment runs.
//!
//! - **Fixtures**: a small range table, sample cowrie-style records, and helpers
//!   that write them to disk in the on-disk formats the pipeline reads
//! - **Assertions**: order-independent record comparison and table shape checks
//!
//! ```
//! use geoenrich::testing::*;
//! use geoenrich::{ExecMode, ErrorPolicy, Runner};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ranges = Arc::new(sample_range_table());
//! let seq = Runner::new(Arc::clone(&ranges), ExecMode::Sequential, ErrorPolicy::Drop)?
//!     .run_all(sample_values())?;
//! let par = Runner::new(ranges, ExecMode::Parallel { threads: Some(4) }, ErrorPolicy::Drop)?
//!     .run_all(sample_values())?;
//! assert_records_unordered_equal(&par.records, &seq.records);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
