use anyhow::Result;
use geoenrich::io::csv::{read_table, write_table};
use geoenrich::testing::*;
use geoenrich::{ErrorPolicy, ExecMode, Table, run_in_memory};
use serde_json::json;
use std::fs;
use std::sync::Arc;

#[test]
fn sample_log_table_shape() -> Result<()> {
    let (table, out) = run_in_memory(
        &sample_log_text(),
        Arc::new(sample_range_table()),
        ExecMode::default(),
        ErrorPolicy::Drop,
    )?;
    assert_table_rectangular(&table);
    assert_header_covers(&table, &out.records);
    assert_eq!(table.len(), 5);
    for col in ["src_ip_code", "src_ip_city", "dst_ip_country", "eventid", "input"] {
        assert!(table.column_index(col).is_some(), "{col}");
    }
    Ok(())
}

#[test]
fn header_does_not_depend_on_thread_count() -> Result<()> {
    let ranges = Arc::new(sample_range_table());
    let (one, _) = run_in_memory(
        &sample_log_text(),
        Arc::clone(&ranges),
        ExecMode::Sequential,
        ErrorPolicy::Drop,
    )?;
    let (many, _) = run_in_memory(
        &sample_log_text(),
        ranges,
        ExecMode::Parallel { threads: Some(4) },
        ErrorPolicy::Drop,
    )?;
    assert_eq!(one.header, many.header);
    let mut a = one.rows.clone();
    let mut b = many.rows.clone();
    a.sort();
    b.sort();
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn missing_keys_become_empty_cells_on_disk() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("nested/out.csv");
    let table = Table::from_records(&[
        record(json!({"b": "x, with comma", "a": 1})),
        record(json!({"c": null})),
    ]);
    assert_eq!(write_table(&path, &table)?, 2);

    let text = fs::read_to_string(&path)?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("a,b,c"));
    assert_eq!(lines.next(), Some("1,\"x, with comma\","));
    assert_eq!(lines.next(), Some(",,"));

    assert_eq!(read_table(&path)?, table);
    Ok(())
}

#[test]
fn empty_input_writes_an_empty_header() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("empty.csv");
    let (table, _) = run_in_memory(
        "",
        Arc::new(sample_range_table()),
        ExecMode::Sequential,
        ErrorPolicy::Drop,
    )?;
    assert!(table.header.is_empty());
    assert_eq!(write_table(&path, &table)?, 0);
    assert_eq!(fs::read(&path)?, b"\n");
    Ok(())
}

#[test]
fn records_without_keys_write_bare_lines() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("blank.csv");
    let table = Table::from_records(&[record(json!({})), record(json!({}))]);
    assert!(table.header.is_empty());
    assert_eq!(write_table(&path, &table)?, 2);
    assert_eq!(fs::read(&path)?, b"\n\n\n");

    let back = read_table(&path)?;
    assert!(back.header.is_empty());
    Ok(())
}

#[test]
fn ragged_table_is_refused() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let table = Table {
        header: vec!["a".into(), "b".into()],
        rows: vec![vec!["1".into()]],
    };
    assert!(write_table(tmp.path().join("bad.csv"), &table).is_err());
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_output_reads_back() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("out.csv.gz");
    let table = Table::from_records(&[record(json!({"src_ip": "8.8.8.8", "n": 2}))]);
    write_table(&path, &table)?;
    assert_ne!(fs::read(&path)?.first(), Some(&b'n'));
    assert_eq!(read_table(&path)?, table);
    Ok(())
}
