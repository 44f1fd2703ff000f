//! File and database I/O: compression, CSV tables, JSONL intermediates, SQL sink.

pub mod compression;
pub mod csv;
pub mod jsonl;

#[cfg_attr(docsrs, doc(cfg(feature = "sql")))]
#[cfg(feature = "sql")]
pub mod sql;

use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::Path;

/// Create `path` (and its parent directories) for writing, compressed according
/// to its extension.
pub(crate) fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    compression::auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))
}
