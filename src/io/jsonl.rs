//! JSON Lines dumps of the normalized and enriched record sets.
//!
//! Written only with `--keep-intermediate`; the pipeline never reads them back.
//! [`read_jsonl_vec`] exists for inspection tools and tests.

use crate::io::compression::auto_detect_reader;
use crate::io::create_output;
use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Write one compact JSON value per line, returning the number written.
///
/// # Errors
/// Returns an error if the file cannot be created or an item fails to serialize.
pub fn write_jsonl_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut w = create_output(path)?;
    for (i, item) in data.iter().enumerate() {
        serde_json::to_writer(&mut w, item)
            .with_context(|| format!("serialize record #{i} to {}", path.display()))?;
        w.write_all(b"\n")?;
    }
    w.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(data.len())
}

/// Read every JSON value of a JSONL dump.
///
/// Values are streamed with [`serde_json::StreamDeserializer`], so blank lines and
/// other whitespace between values are ignored.
///
/// # Errors
/// Returns an error naming the byte offset of the first value that fails to parse.
pub fn read_jsonl_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut stream = serde_json::Deserializer::from_reader(BufReader::new(rdr)).into_iter::<T>();
    let mut out = Vec::new();
    loop {
        let offset = stream.byte_offset();
        match stream.next() {
            Some(v) => out.push(
                v.with_context(|| format!("parse value at byte {offset} in {}", path.display()))?,
            ),
            None => break,
        }
    }
    Ok(out)
}
