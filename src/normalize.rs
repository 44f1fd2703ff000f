//! Stream normalizer for concatenated JSON logs.
//!
//! Loggers such as cowrie append one JSON object per event with no separating commas
//! and no enclosing array, so a file looks like `{"a":1}{"a":2}` or
//! `{"a":1}\n{"a":2}`. [`normalize`] inserts the missing commas at every `}{`,
//! `}\n{` and `}\r\n{` boundary, wraps the text in `[`…`]`, and parses the result as
//! one array. Any other whitespace between braces is left alone.
//!
//! This is a textual heuristic, not a tokenizer: a string value containing a literal
//! `}{` or `}\n{` is rewritten as well.

use crate::error::FormatError;
use crate::io::compression::auto_detect_reader;
use regex::Regex;
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}(?:\r?\n)?\{").expect("valid boundary regex"));

/// Insert `,` between back-to-back objects and wrap the text in an array.
///
/// Text that already starts with `[` is returned untouched.
#[must_use]
pub fn repair(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.starts_with('[') {
        return trimmed.to_string();
    }
    let joined = BOUNDARY.replace_all(trimmed, "},{");
    let mut out = String::with_capacity(joined.len() + 2);
    out.push('[');
    out.push_str(&joined);
    out.push(']');
    out
}

/// Split raw log text into individual JSON values.
///
/// Empty (or whitespace-only) input yields no records.
///
/// # Errors
/// [`FormatError::Parse`] when the repaired text is not a JSON array. The error
/// carries an empty path; callers that know the file use [`FormatError::with_path`].
pub fn normalize(raw: &str) -> Result<Vec<Value>, FormatError> {
    let repaired = repair(raw);
    if repaired == "[]" {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<Value>>(&repaired).map_err(|source| FormatError::Parse {
        path: Default::default(),
        line: source.line(),
        column: source.column(),
        source,
    })
}

/// Read a (possibly compressed) log file and [`normalize`] it.
///
/// # Errors
/// [`FormatError::Io`] if the file cannot be read, [`FormatError::Parse`] naming the
/// file if it cannot be repaired.
pub fn normalize_file(path: impl AsRef<Path>) -> Result<Vec<Value>, FormatError> {
    let path = path.as_ref();
    let io_err = |source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    };
    let f = File::open(path).map_err(io_err)?;
    let mut rdr = auto_detect_reader(f, path)
        .map_err(|e| io_err(std::io::Error::other(e.to_string())))?;
    let mut raw = String::new();
    rdr.read_to_string(&mut raw).map_err(io_err)?;
    normalize(&raw).map_err(|e| e.with_path(path))
}
