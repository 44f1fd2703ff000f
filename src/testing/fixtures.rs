//! Pre-built range tables and cowrie-style logs.

use crate::Record;
use crate::geo::{Location, RangeEntry, RangeTable};
use crate::normalize::normalize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// `8.8.8.0/24`, in the dataset's decimal form.
pub const GOOGLE_DNS_RANGE: (u32, u32) = (134_744_064, 134_744_319);

fn loc(code: &str, country: &str, region: &str, city: &str) -> Location {
    Location {
        code: code.into(),
        country: country.into(),
        region: region.into(),
        city: city.into(),
    }
}

/// A handful of disjoint ranges. `192.168.0.0/16` is deliberately not covered.
#[must_use]
pub fn sample_range_entries() -> Vec<RangeEntry> {
    vec![
        RangeEntry {
            start: 0,
            end: 16_777_215,
            location: loc("-", "-", "-", "-"),
        },
        RangeEntry {
            start: 16_843_008,
            end: 16_843_263,
            location: loc("AU", "Australia", "New South Wales", "Sydney"),
        },
        RangeEntry {
            start: GOOGLE_DNS_RANGE.0,
            end: GOOGLE_DNS_RANGE.1,
            location: loc("US", "United States", "California", "Mountain View"),
        },
        RangeEntry {
            start: 1_359_103_232,
            end: 1_359_103_487,
            location: loc("GB", "United Kingdom", "England", "London"),
        },
    ]
}

#[must_use]
pub fn sample_range_table() -> RangeTable {
    RangeTable::from_entries(sample_range_entries())
}

/// [`sample_range_entries`] in IP2Location LITE DB9 layout, quoted, with the
/// latitude/longitude/postal columns the loader ignores.
#[must_use]
pub fn sample_range_csv() -> String {
    sample_range_entries()
        .iter()
        .map(|e| {
            format!(
                "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"0.000000\",\"0.000000\",\"-\"\n",
                e.start,
                e.end,
                e.location.code,
                e.location.country,
                e.location.region,
                e.location.city
            )
        })
        .collect()
}

/// Write [`sample_range_csv`] into `dir` and return its path.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_range_csv(dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let path = dir.as_ref().join("IP2LOCATION-LITE-DB9.CSV");
    fs::write(&path, sample_range_csv())?;
    Ok(path)
}

/// Five cowrie events glued together the way cowrie writes them: some back to
/// back, some separated by newlines.
///
/// Three of them carry an address covered by [`sample_range_table`].
#[must_use]
pub fn sample_log_text() -> String {
    [
        r#"{"eventid":"cowrie.session.connect","src_ip":"8.8.8.8","src_port":40122,"dst_ip":"192.168.1.10","dst_port":22,"session":"a1"}"#,
        r#"{"eventid":"cowrie.login.failed","username":"root","password":"123456","src_ip":"81.2.69.160","session":"a1"}"#,
        "\n",
        r#"{"eventid":"cowrie.command.input","input":"uname -a","session":"a1","timestamp":"2016-10-05T08:23:11.123456Z"}"#,
        "\n",
        r#"{"eventid":"cowrie.session.connect","src_ip":"1.1.1.1","dst_ip":"8.8.8.8","session":"b2"}"#,
        r#"{"eventid":"cowrie.client.version","version":"SSH-2.0-libssh","src_ip":"bad","session":"b2"}"#,
        "\n",
    ]
    .concat()
}

/// [`sample_log_text`] already split into values.
///
/// # Panics
/// Never for the built-in text.
#[must_use]
pub fn sample_values() -> Vec<Value> {
    normalize(&sample_log_text()).expect("sample log is repairable")
}

/// Write [`sample_log_text`] into `dir` as `cowrie.json` and return its path.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_sample_log(dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let path = dir.as_ref().join("cowrie.json");
    fs::write(&path, sample_log_text())?;
    Ok(path)
}

/// Unwrap a `json!({...})` literal into a [`Record`].
///
/// # Panics
/// Panics if `v` is not a JSON object.
#[must_use]
pub fn record(v: Value) -> Record {
    match v {
        Value::Object(m) => m,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_log_has_five_records() {
        assert_eq!(sample_values().len(), 5);
    }

    #[test]
    fn sample_ranges_are_disjoint_and_sorted() {
        let entries = sample_range_entries();
        for pair in entries.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }
}
