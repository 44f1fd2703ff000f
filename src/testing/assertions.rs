//! Assertion functions for enriched records and tables.

use crate::Record;
use crate::table::Table;

/// Assert that two record sets contain the same records, ignoring order.
///
/// Records are compared as maps, so key order inside a record does not matter
/// either. Duplicates are counted.
///
/// # Panics
///
/// Panics if the sets differ in size or content.
pub fn assert_records_unordered_equal(actual: &[Record], expected: &[Record]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Record count mismatch:\n  Expected: {}\n  Actual: {}",
        expected.len(),
        actual.len()
    );

    let mut remaining: Vec<&Record> = actual.iter().collect();
    for e in expected {
        match remaining.iter().position(|a| *a == e) {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => panic!(
                "Expected record not found:\n  Missing: {e:?}\n  Actual: {actual:?}"
            ),
        }
    }
}

/// Assert the dynamic-schema guarantees of `table`: header sorted and free of
/// duplicates, every row exactly as wide as the header.
///
/// # Panics
///
/// Panics on the first violated guarantee.
pub fn assert_table_rectangular(table: &Table) {
    for pair in table.header.windows(2) {
        assert!(
            pair[0] < pair[1],
            "Header not strictly sorted: {:?} before {:?}",
            pair[0],
            pair[1]
        );
    }
    for (i, row) in table.rows.iter().enumerate() {
        assert_eq!(
            row.len(),
            table.header.len(),
            "Row {i} has {} cells, header has {}",
            row.len(),
            table.header.len()
        );
    }
}

/// Assert that every key of every record appears in the header.
///
/// # Panics
///
/// Panics naming the first missing key.
pub fn assert_header_covers(table: &Table, records: &[Record]) {
    for r in records {
        for k in r.keys() {
            assert!(
                table.header.contains(k),
                "Key {k:?} missing from header {:?}",
                table.header
            );
        }
    }
}
