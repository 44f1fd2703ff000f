//! Record enricher.
//!
//! For every field whose value is a dotted-quad IPv4 string, [`enrich`] looks the
//! address up in the [`RangeTable`] and adds four derived fields:
//!
//! | derived key        | source              |
//! |--------------------|---------------------|
//! | `<field>_code`     | [`Location::code`]    |
//! | `<field>_country`  | [`Location::country`] |
//! | `<field>_region`   | [`Location::region`]  |
//! | `<field>_city`     | [`Location::city`]    |
//!
//! Addresses with no covering range are left alone. The input record is never
//! mutated; a new record is returned.

use crate::Record;
use crate::error::RecordError;
use crate::geo::{Location, RangeTable};
use serde_json::Value;

/// Suffixes of the derived location fields, in insertion order.
pub const DERIVED_SUFFIXES: [&str; 4] = ["_code", "_country", "_region", "_city"];

/// Result of enriching one record.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichOutcome {
    pub record: Record,
    /// Number of IP-valued fields that matched a range.
    pub enriched_fields: usize,
}

/// Strict dotted-quad check: four `.`-separated decimal octets in `[0, 255]`.
///
/// Plain integers, hostnames, partial forms (`1.2.3`), signs, whitespace and
/// empty octets are rejected. Leading zeros are read as decimal.
#[must_use]
pub fn looks_like_ipv4(s: &str) -> bool {
    parse_ipv4(s).is_some()
}

/// Parse a dotted quad into its big-endian decimal value.
#[must_use]
pub fn parse_ipv4(s: &str) -> Option<u32> {
    let mut value = 0u32;
    let mut parts = 0;
    for octet in s.split('.') {
        parts += 1;
        if parts > 4 || octet.is_empty() || octet.len() > 3 {
            return None;
        }
        if !octet.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u32 = octet.parse().ok()?;
        if n > 255 {
            return None;
        }
        value = (value << 8) | n;
    }
    (parts == 4).then_some(value)
}

/// Enrich a copy of `record` with location fields for each IPv4-valued field.
///
/// # Errors
/// [`RecordError::KeyCollision`] if a derived key already exists with a different
/// value.
pub fn enrich(record: &Record, table: &RangeTable) -> Result<Record, RecordError> {
    enrich_counted(record, table).map(|o| o.record)
}

/// Like [`enrich`], also reporting how many fields were enriched.
///
/// # Errors
/// See [`enrich`].
pub fn enrich_counted(record: &Record, table: &RangeTable) -> Result<EnrichOutcome, RecordError> {
    let mut derived: Vec<(String, String)> = Vec::new();
    let mut enriched_fields = 0;
    for (key, value) in record {
        let Some(ip) = value.as_str().and_then(parse_ipv4) else {
            continue;
        };
        if let Some(location) = table.lookup(ip) {
            enriched_fields += 1;
            derived.extend(derived_fields(key, location));
        }
    }

    if let Some((key, _)) = derived.iter().find(|(k, v)| {
        record
            .get(k)
            .is_some_and(|existing| existing.as_str() != Some(v.as_str()))
    }) {
        return Err(RecordError::KeyCollision { key: key.clone() });
    }

    let mut out = record.clone();
    for (k, v) in derived {
        out.insert(k, Value::String(v));
    }
    Ok(EnrichOutcome {
        record: out,
        enriched_fields,
    })
}

/// Enrich a normalized element, which must be a JSON object.
///
/// # Errors
/// [`RecordError::NotAnObject`] for arrays and scalars, otherwise see [`enrich`].
pub fn enrich_value(value: &Value, table: &RangeTable) -> Result<EnrichOutcome, RecordError> {
    match value {
        Value::Object(record) => enrich_counted(record, table),
        other => Err(RecordError::NotAnObject {
            kind: value_kind(other),
        }),
    }
}

fn derived_fields<'a>(
    key: &'a str,
    location: &'a Location,
) -> impl Iterator<Item = (String, String)> + 'a {
    let values = [
        &location.code,
        &location.country,
        &location.region,
        &location.city,
    ];
    DERIVED_SUFFIXES
        .into_iter()
        .zip(values)
        .map(move |(suffix, v)| (format!("{key}{suffix}"), v.clone()))
}

pub(crate) fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
